//! CaptureOrderHandler - Command handler for capturing a payment order.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{Activation, SettlementError, Subscription};
use crate::ports::{EntitlementStore, SettlementGateway};

/// Entitlement window granted by a one-off capture.
const CAPTURE_PERIOD_DAYS: i64 = 30;

/// Command to capture a previously created order.
#[derive(Debug, Clone)]
pub struct CaptureOrderCommand {
    pub user_id: UserId,
    pub order_id: String,
}

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureOrderResult {
    pub capture_id: String,
    pub status: String,
    pub subscription: Subscription,
}

/// Handler for capturing orders and activating the buyer's entitlement.
///
/// The store is only written after the gateway confirmed the capture,
/// so a gateway failure never leaves a half-activated record.
pub struct CaptureOrderHandler {
    store: Arc<dyn EntitlementStore>,
    gateway: Arc<dyn SettlementGateway>,
}

impl CaptureOrderHandler {
    pub fn new(store: Arc<dyn EntitlementStore>, gateway: Arc<dyn SettlementGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CaptureOrderCommand,
    ) -> Result<CaptureOrderResult, SettlementError> {
        // 1. Validate the order reference
        if cmd.order_id.trim().is_empty() {
            return Err(SettlementError::validation("order_id", "cannot be empty"));
        }

        // 2. Load the buyer's record before charging anything
        let mut subscription = self
            .store
            .get(&cmd.user_id)
            .await?
            .ok_or_else(|| SettlementError::user_not_found(cmd.user_id.clone()))?;

        // 3. Capture the order at the gateway
        let captured = self.gateway.capture_order(&cmd.order_id).await?;

        // 4. Activate the entitlement with the capture identity
        subscription.activate(Activation {
            provider: self.gateway.provider_name().to_string(),
            plan_id: captured.plan_id.clone(),
            subscription_id: captured.capture_id.clone(),
            period_end: Timestamp::now().add_days(CAPTURE_PERIOD_DAYS),
        })?;

        // 5. Retain the raw gateway payload for audit
        subscription.set_metadata("capture", captured.raw.clone());

        // 6. Persist the activated record
        self.store.set(&cmd.user_id, &subscription).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            capture_id = %captured.capture_id,
            "Order captured and entitlement activated"
        );

        Ok(CaptureOrderResult {
            capture_id: captured.capture_id,
            status: captured.status,
            subscription,
        })
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
        fail_set: bool,
    }

    impl MockStore {
        fn with_user(user_id: &UserId) -> Self {
            let mut records = HashMap::new();
            records.insert(user_id.as_str().to_string(), Subscription::new());
            Self {
                records: Mutex::new(records),
                fail_set: false,
            }
        }

        fn empty() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                fail_set: false,
            }
        }

        fn failing_writes(user_id: &UserId) -> Self {
            let mut store = Self::with_user(user_id);
            store.fail_set = true;
            store
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
            if self.fail_set {
                return Err(StoreError::IoError("Simulated write failure".to_string()));
            }
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

    struct MockGateway {
        captured_orders: Mutex<Vec<String>>,
        fail_capture: bool,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                captured_orders: Mutex::new(Vec::new()),
                fail_capture: false,
            }
        }

        fn failing() -> Self {
            Self {
                captured_orders: Mutex::new(Vec::new()),
                fail_capture: true,
            }
        }

        fn captured_orders(&self) -> Vec<String> {
            self.captured_orders.lock().unwrap().clone()
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

        async fn capture_order(&self, order_id: &str) -> Result<OrderCaptured, GatewayError> {
            if self.fail_capture {
                return Err(GatewayError::provider("Capture declined"));
            }
            self.captured_orders.lock().unwrap().push(order_id.to_string());
            Ok(OrderCaptured {
                capture_id: "CAP-1".to_string(),
                order_id: order_id.to_string(),
                plan_id: "premium".to_string(),
                status: "COMPLETED".to_string(),
                raw: serde_json::json!({"id": order_id, "status": "COMPLETED"}),
            })
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
            Err(GatewayError::provider("Not used in this test"))
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

    fn test_command() -> CaptureOrderCommand {
        CaptureOrderCommand {
            user_id: test_user_id(),
            order_id: "ORDER-1".to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn captures_and_activates_entitlement() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store.clone(), gateway.clone());

        let result = handler.handle(test_command()).await.unwrap();

        assert_eq!(result.capture_id, "CAP-1");
        assert_eq!(result.status, "COMPLETED");
        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        assert_eq!(result.subscription.provider, Some("mock".to_string()));
        assert_eq!(result.subscription.subscription_id, Some("CAP-1".to_string()));
        assert_eq!(gateway.captured_orders(), vec!["ORDER-1".to_string()]);

        let stored = store.stored(&test_user_id()).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert!(stored.has_access(Timestamp::now()));
    }

    #[tokio::test]
    async fn grants_thirty_day_window() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store, gateway);

        let result = handler.handle(test_command()).await.unwrap();

        let period_end = result.subscription.current_period_end.unwrap();
        assert!(period_end.is_after(&Timestamp::now().add_days(29)));
        assert!(Timestamp::now().add_days(31).is_after(&period_end));
    }

    #[tokio::test]
    async fn retains_raw_capture_payload() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store.clone(), gateway);

        handler.handle(test_command()).await.unwrap();

        let stored = store.stored(&test_user_id()).unwrap();
        let capture = stored.metadata.get("capture").unwrap();
        assert_eq!(capture["id"], "ORDER-1");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn fails_on_empty_order_id() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store, gateway.clone());

        let mut cmd = test_command();
        cmd.order_id = String::new();

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(SettlementError::ValidationFailed { .. })));
        assert!(gateway.captured_orders().is_empty());
    }

    #[tokio::test]
    async fn fails_for_unknown_user_without_charging() {
        let store = Arc::new(MockStore::empty());
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store, gateway.clone());

        let result = handler.handle(test_command()).await;

        assert!(matches!(result, Err(SettlementError::UserNotFound(_))));
        assert!(gateway.captured_orders().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_record_untouched() {
        let store = Arc::new(MockStore::with_user(&test_user_id()));
        let gateway = Arc::new(MockGateway::failing());
        let handler = CaptureOrderHandler::new(store.clone(), gateway);

        let result = handler.handle(test_command()).await;

        assert!(matches!(result, Err(SettlementError::GatewayRejected { .. })));
        let stored = store.stored(&test_user_id()).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Inactive);
    }

    #[tokio::test]
    async fn store_write_failure_surfaces_as_infrastructure() {
        let store = Arc::new(MockStore::failing_writes(&test_user_id()));
        let gateway = Arc::new(MockGateway::new());
        let handler = CaptureOrderHandler::new(store, gateway);

        let result = handler.handle(test_command()).await;
        assert!(matches!(result, Err(SettlementError::Infrastructure(_))));
    }
}
