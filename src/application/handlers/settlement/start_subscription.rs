//! StartSubscriptionHandler - Command handler for creating a recurring subscription.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{Activation, SettlementError, Subscription};
use crate::ports::{EntitlementStore, SettlementGateway, StartSubscriptionRequest, SubscriptionStarted};

/// Fallback entitlement window when the gateway reports no billing time.
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Command to start a recurring subscription.
#[derive(Debug, Clone)]
pub struct StartSubscriptionCommand {
    pub user_id: UserId,
    pub plan_name: String,
    pub price: String,
    pub currency: String,
}

/// Result of starting a subscription.
#[derive(Debug, Clone)]
pub enum StartSubscriptionResult {
    /// The gateway wants buyer approval first; redirect to the link.
    /// Nothing is stored until the subscription is confirmed.
    PendingApproval {
        subscription_id: String,
        approve_url: String,
    },
    /// The subscription activated immediately (simulation mode).
    Activated { subscription: Subscription },
}

/// Handler for starting recurring subscriptions.
///
/// Against the live gateway this ends with an approval redirect; the
/// entitlement is only written once `confirm` or a webhook reports the
/// subscription active. The simulated gateway activates in one step.
pub struct StartSubscriptionHandler {
    store: Arc<dyn EntitlementStore>,
    gateway: Arc<dyn SettlementGateway>,
}

impl StartSubscriptionHandler {
    pub fn new(store: Arc<dyn EntitlementStore>, gateway: Arc<dyn SettlementGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: StartSubscriptionCommand,
    ) -> Result<StartSubscriptionResult, SettlementError> {
        // 1. Validate the plan price
        if cmd.price.trim().is_empty() {
            return Err(SettlementError::validation("price", "cannot be empty"));
        }

        // 2. The caller must be a known user before we touch the gateway
        let mut subscription = self
            .store
            .get(&cmd.user_id)
            .await?
            .ok_or_else(|| SettlementError::user_not_found(cmd.user_id.clone()))?;

        // 3. Create the subscription at the gateway
        let started = self
            .gateway
            .start_subscription(StartSubscriptionRequest {
                plan_name: cmd.plan_name.clone(),
                price: cmd.price,
                currency: cmd.currency,
            })
            .await?;

        match started {
            SubscriptionStarted::PendingApproval {
                subscription_id,
                approve_url,
            } => {
                tracing::info!(
                    user_id = %cmd.user_id,
                    subscription_id = %subscription_id,
                    "Subscription pending buyer approval"
                );
                Ok(StartSubscriptionResult::PendingApproval {
                    subscription_id,
                    approve_url,
                })
            }
            SubscriptionStarted::Activated(state) => {
                // 4. Immediate activation: commit the entitlement now
                let plan_id = state.plan_id.clone().unwrap_or(cmd.plan_name);
                let period_end = state
                    .next_billing_time
                    .unwrap_or_else(|| Timestamp::now().add_days(DEFAULT_PERIOD_DAYS));

                subscription.activate(Activation {
                    provider: self.gateway.provider_name().to_string(),
                    plan_id,
                    subscription_id: state.subscription_id.clone(),
                    period_end,
                })?;
                subscription.set_metadata("gateway", state.raw.clone());

                self.store.set(&cmd.user_id, &subscription).await?;

                tracing::info!(
                    user_id = %cmd.user_id,
                    subscription_id = %state.subscription_id,
                    "Subscription activated immediately"
                );
                Ok(StartSubscriptionResult::Activated { subscription })
            }
        }
    }
}
