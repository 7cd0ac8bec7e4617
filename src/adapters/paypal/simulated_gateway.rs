//! Simulated settlement gateway.
//!
//! Satisfies the `SettlementGateway` contract without contacting
//! PayPal. Selected at startup when simulation is enabled or gateway
//! credentials are absent; every operation succeeds with synthesized
//! identifiers and a 30-day entitlement window. This backs local
//! development and test deployments, not unit tests (those use mocks).

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CreateOrderRequest, GatewayError, OrderCaptured, OrderCreated, SettlementGateway,
    StartSubscriptionRequest, SubscriptionStarted, SubscriptionState, WebhookHeaders,
    WebhookVerification,
};

/// Entitlement window granted by simulated settlements.
const SIMULATED_PERIOD_DAYS: i64 = 30;

/// Plan recorded on simulated captures and confirmations.
const SIMULATED_PLAN: &str = "monthly";

/// Gateway stand-in that settles everything locally.
#[derive(Debug, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SettlementGateway for SimulatedGateway {
    fn provider_name(&self) -> &'static str {
        "simulated"
    }

    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, GatewayError> {
        let order_id = format!("SIMULATED_ORDER_{}", Timestamp::now().as_unix_millis());
        tracing::info!(order_id = %order_id, plan_id = %request.plan_id, "Simulated order created");
        Ok(OrderCreated {
            order_id,
            status: "CREATED".to_string(),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<OrderCaptured, GatewayError> {
        let capture_id = format!("SIM-{}", Timestamp::now().as_unix_millis());
        tracing::info!(order_id = %order_id, capture_id = %capture_id, "Simulated order captured");
        Ok(OrderCaptured {
            capture_id: capture_id.clone(),
            order_id: order_id.to_string(),
            plan_id: SIMULATED_PLAN.to_string(),
            status: "COMPLETED".to_string(),
            raw: serde_json::json!({ "simulated": true, "id": capture_id }),
        })
    }

    async fn start_subscription(
        &self,
        request: StartSubscriptionRequest,
    ) -> Result<SubscriptionStarted, GatewayError> {
        let subscription_id = format!("SIM_SUB_{}", Timestamp::now().as_unix_millis());
        let next_billing_time = Timestamp::now().add_days(SIMULATED_PERIOD_DAYS);

        tracing::info!(
            subscription_id = %subscription_id,
            plan = %request.plan_name,
            "Simulated subscription activated"
        );
        Ok(SubscriptionStarted::Activated(SubscriptionState {
            subscription_id: subscription_id.clone(),
            plan_id: Some(request.plan_name),
            status: "ACTIVE".to_string(),
            next_billing_time: Some(next_billing_time),
            raw: serde_json::json!({ "simulated": true, "id": subscription_id }),
        }))
    }

    async fn confirm_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, GatewayError> {
        tracing::info!(subscription_id = %subscription_id, "Simulated subscription confirmed");
        Ok(SubscriptionState {
            subscription_id: subscription_id.to_string(),
            plan_id: Some(SIMULATED_PLAN.to_string()),
            status: "ACTIVE".to_string(),
            next_billing_time: Some(Timestamp::now().add_days(SIMULATED_PERIOD_DAYS)),
            raw: serde_json::json!({ "simulated": true, "id": subscription_id }),
        })
    }

    async fn verify_webhook(
        &self,
        _headers: &WebhookHeaders,
        _payload: &serde_json::Value,
    ) -> WebhookVerification {
        WebhookVerification::skipped()
    }
}
