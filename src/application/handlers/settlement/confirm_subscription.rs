//! ConfirmSubscriptionHandler - Command handler for confirming an approved subscription.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{Activation, SettlementError, Subscription};
use crate::ports::{EntitlementStore, SettlementGateway};

/// Gateway statuses that commit the entitlement.
///
/// `APPROVAL_PENDING` and `APPROVED` are accepted because the first
/// charge may still be settling right after the buyer approved.
const ACTIVATABLE_STATUSES: [&str; 3] = ["ACTIVE", "APPROVAL_PENDING", "APPROVED"];

/// Fallback entitlement window when the gateway reports no billing time.
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Fallback plan id when neither the gateway nor the stored record has one.
const DEFAULT_PLAN: &str = "monthly";

/// Command to confirm a subscription the buyer approved.
#[derive(Debug, Clone)]
pub struct ConfirmSubscriptionCommand {
    pub user_id: UserId,
    pub subscription_id: String,
}

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmSubscriptionResult {
    pub subscription: Subscription,
}

/// Handler for confirming subscriptions after buyer approval.
///
/// Fetches the gateway-side state and commits the entitlement when the
/// subscription is active or about to become active. Safe to retry:
/// re-confirming an active subscription rewrites the same record.
pub struct ConfirmSubscriptionHandler {
    store: Arc<dyn EntitlementStore>,
    gateway: Arc<dyn SettlementGateway>,
}

impl ConfirmSubscriptionHandler {
    pub fn new(store: Arc<dyn EntitlementStore>, gateway: Arc<dyn SettlementGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmSubscriptionCommand,
    ) -> Result<ConfirmSubscriptionResult, SettlementError> {
        // 1. Validate the subscription reference
        if cmd.subscription_id.trim().is_empty() {
            return Err(SettlementError::validation(
                "subscription_id",
                "cannot be empty",
            ));
        }

        // 2. Load the caller's record
        let mut subscription = self
            .store
            .get(&cmd.user_id)
            .await?
            .ok_or_else(|| SettlementError::user_not_found(cmd.user_id.clone()))?;

        // 3. Ask the gateway for the subscription's current state
        let state = self.gateway.confirm_subscription(&cmd.subscription_id).await?;

        // 4. Only statuses on their way to active commit anything
        if !ACTIVATABLE_STATUSES.contains(&state.status.as_str()) {
            tracing::warn!(
                user_id = %cmd.user_id,
                subscription_id = %state.subscription_id,
                status = %state.status,
                "Subscription not activatable"
            );
            return Err(SettlementError::not_activatable(state.status));
        }

        // 5. Commit the entitlement
        let plan_id = state
            .plan_id
            .clone()
            .or_else(|| subscription.plan_id.clone())
            .unwrap_or_else(|| DEFAULT_PLAN.to_string());
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
            gateway_status = %state.status,
            "Subscription confirmed"
        );

        Ok(ConfirmSubscriptionResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::{
        CreateOrderRequest, GatewayError, OrderCaptured, OrderCreated, StartSubscriptionRequest,
        StoreError, SubscriptionStarted, SubscriptionState, WebhookHeaders, WebhookVerification,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockStore {
        records: Mutex<HashMap<String, Subscription>>,
    }

    impl MockStore {
        fn with_user(user_id: &UserId) -> Self {
            Self::with_record(user_id, Subscription::new())
        }

        fn with_record(user_id: &UserId, subscription: Subscription) -> Self {
            let mut records = HashMap::new();
            records.insert(user_id.as_str().to_string(), subscription);
            Self {
                records: Mutex::new(records),
            }
        }

        fn empty() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
            }
        }

        fn stored(&self, user_id: &UserId) -> Option<Subscription> {
            self.records.lock().unwrap().get(user_id.as_str()).cloned()
        }
    }

    #[async_trait]
    impl EntitlementStore for MockStore {
        async fn get(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError> {
            Ok(self.records.lock().unwrap().get(user_id.as_str()).cloned())
        }

        async fn set(
            &self,
            user_id: &UserId,
            subscription: &Subscription,
        ) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();
            if !records.contains_key(user_id.as_str()) {
                return Err(StoreError::NotFound(user_id.clone()));
            }
            records.insert(user_id.as_str().to_string(), subscription.clone());
            Ok(())
        }

        async fn find_user_by_subscription_id(
            &self,
            _subscription_id: &str,
        ) -> Result<Option<UserId>, StoreError> {
            Ok(None)
        }

        async fn find_user_by_email(&self, _email: &str) -> Result<Option<UserId>, StoreError> {
            Ok(None)
        }
    }

    enum MockResponse {
        State(SubscriptionState),
        Error(GatewayError),
    }

    struct MockGateway {
        response: MockResponse,
    }

    impl MockGateway {
        fn reporting(state: SubscriptionState) -> Self {
            Self {
                response: MockResponse::State(state),
            }
        }

        fn failing() -> Self {
            Self {
                response: MockResponse::Error(GatewayError::provider("Lookup failed")),
            }
        }

        fn timing_out() -> Self {
            Self {
                response: MockResponse::Error(GatewayError::timeout("No response within 10s")),
            }
        }
    }

    #[async_trait]
    impl SettlementGateway for MockGateway {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn create_order(
            &self,
            _request: CreateOrderRequest,
        ) -> Result<OrderCreated, GatewayError> {
            Err(GatewayError::provider("Not used in this test"))
        }

        async fn capture_order(&self, _order_id: &str) -> Result<OrderCaptured, GatewayError> {
            Err(GatewayError::provider("Not used in this test"))
        }

        async fn start_subscription(
            &self,
            _request: StartSubscriptionRequest,
        ) -> Result<SubscriptionStarted, GatewayError> {
            Err(GatewayError::provider("Not used in this test"))
        }

        async fn confirm_subscription(
            &self,
            _subscription_id: &str,
        ) -> Result<SubscriptionState, GatewayError> {
            match &self.response {
                MockResponse::State(state) => Ok(state.clone()),
                MockResponse::Error(err) => Err(err.clone()),
            }
        }

        async fn verify_webhook(
            &self,
            _headers: &WebhookHeaders,
            _body: &serde_json::Value,
        ) -> WebhookVerification {
            WebhookVerification::skipped()
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn test_user_id() -> UserId {
        UserId::new("test-user-123").unwrap()
    }

    fn test_command() -> ConfirmSubscriptionCommand {
        ConfirmSubscriptionCommand {
            user_id: test_user_id(),
            subscription_id: "I-ABC".to_string(),
        }
    }

    fn active_state() -> SubscriptionState {
        SubscriptionState {
            subscription_id: "I-ABC".to_string(),
            plan_id: Some("P-123".to_string()),
            status: "ACTIVE".to_string(),
            next_billing_time: Some(Timestamp::now().add_days(30)),
            raw: serde_json::json!({"id": "I-ABC", "status": "ACTIVE"}),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn commits_active_subscription() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(active_state()));
        let handler = ConfirmSubscriptionHandler::new(store.clone(), gateway);

        let result = handler.handle(test_command()).await.unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        assert_eq!(result.subscription.provider, Some("mock".to_string()));
        assert_eq!(result.subscription.subscription_id, Some("I-ABC".to_string()));
        assert_eq!(result.subscription.plan_id, Some("P-123".to_string()));

        let stored = store.stored(&test_user_id()).unwrap();
        assert!(stored.has_access(Timestamp::now()));
        assert!(stored.metadata.contains_key("gateway"));
    }

    #[tokio::test]
    async fn accepts_approval_pending_status() {
        let mut state = active_state();
        state.status = "APPROVAL_PENDING".to_string();
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(state));
        let handler = ConfirmSubscriptionHandler::new(store.clone(), gateway);

        let result = handler.handle(test_command()).await;
        assert!(result.is_ok());
        assert_eq!(
            store.stored(&test_user_id()).unwrap().status,
            SubscriptionStatus::Active
        );
    }

    #[tokio::test]
    async fn reconfirming_yields_same_entitlement() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(active_state()));
        let handler = ConfirmSubscriptionHandler::new(store.clone(), gateway);

        handler.handle(test_command()).await.unwrap();
        let first = store.stored(&test_user_id()).unwrap();

        handler.handle(test_command()).await.unwrap();
        let second = store.stored(&test_user_id()).unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.subscription_id, second.subscription_id);
        assert_eq!(first.plan_id, second.plan_id);
        assert_eq!(first.current_period_end, second.current_period_end);
    }

    #[tokio::test]
    async fn plan_falls_back_to_stored_record() {
        let mut state = active_state();
        state.plan_id = None;
        let mut existing = Subscription::new();
        existing.plan_id = Some("premium".to_string());

        let store = Arc::new(MockStore::with_record(&test_user_id(), existing));
        let gateway = Arc::new(MockGateway::reporting(state));
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await.unwrap();
        assert_eq!(result.subscription.plan_id, Some("premium".to_string()));
    }

    #[tokio::test]
    async fn plan_falls_back_to_default() {
        let mut state = active_state();
        state.plan_id = None;
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(state));
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await.unwrap();
        assert_eq!(result.subscription.plan_id, Some("monthly".to_string()));
    }

    #[tokio::test]
    async fn defaults_period_when_gateway_reports_none() {
        let mut state = active_state();
        state.next_billing_time = None;
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(state));
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await.unwrap();
        let period_end = result.subscription.current_period_end.unwrap();
        assert!(period_end.is_after(&Timestamp::now().add_days(29)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn rejects_non_activatable_status() {
        let mut state = active_state();
        state.status = "CANCELLED".to_string();
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(state));
        let handler = ConfirmSubscriptionHandler::new(store.clone(), gateway);

        let result = handler.handle(test_command()).await;

        assert!(matches!(
            result,
            Err(SettlementError::NotActivatable { ref status }) if status == "CANCELLED"
        ));
        let stored = store.stored(&test_user_id()).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Inactive);
    }

    #[tokio::test]
    async fn fails_on_empty_subscription_id() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::reporting(active_state()));
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let mut cmd = test_command();
        cmd.subscription_id = " ".to_string();

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(SettlementError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn fails_for_unknown_user() {
        let store = Arc::new(MockStore::empty());
        let gateway = Arc::new(MockGateway::reporting(active_state()));
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await;
        assert!(matches!(result, Err(SettlementError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn maps_gateway_failure() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::failing());
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await;
        assert!(matches!(result, Err(SettlementError::GatewayRejected { .. })));
    }

    #[tokio::test]
    async fn maps_gateway_timeout() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::timing_out());
        let handler = ConfirmSubscriptionHandler::new(store, gateway);

        let result = handler.handle(test_command()).await;
        assert!(matches!(result, Err(SettlementError::GatewayTimeout)));
    }
}
