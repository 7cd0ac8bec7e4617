//! CancelSubscriptionHandler - Command handler for cancelling a subscription.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SettlementError, Subscription};
use crate::ports::EntitlementStore;

/// Command to cancel the caller's subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

/// Result of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
}

/// Handler for cancelling subscriptions.
///
/// Cancellation is a local state change: it stops the renewal from
/// counting as entitlement but leaves the already-paid period end in
/// place. The gateway learns about it through its own billing flow.
pub struct CancelSubscriptionHandler {
    store: Arc<dyn EntitlementStore>,
}

impl CancelSubscriptionHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, SettlementError> {
        // 1. Load the caller's record
        let mut subscription = self
            .store
            .get(&cmd.user_id)
            .await?
            .ok_or_else(|| SettlementError::user_not_found(cmd.user_id.clone()))?;

        // 2. Transition to cancelled
        subscription.cancel()?;

        // 3. Persist
        self.store.set(&cmd.user_id, &subscription).await?;

        tracing::info!(user_id = %cmd.user_id, "Subscription cancelled");

        Ok(CancelSubscriptionResult { subscription })
    }
}
