//! GetSubscriptionStatusHandler - Query handler for the caller's subscription state.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SettlementError, Subscription};
use crate::ports::EntitlementStore;

/// Query for a user's subscription state.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub user_id: UserId,
}

/// The subscription record plus the entitlement answer at query time.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusResult {
    pub subscription: Subscription,
    pub is_active: bool,
}

/// Handler for reading subscription status.
///
/// Users who never purchased anything get their defaulted record back,
/// not an error; only unknown users (no account row at all) are a 404.
pub struct GetSubscriptionStatusHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<GetSubscriptionStatusResult, SettlementError> {
        let subscription = self
            .store
            .get(&query.user_id)
            .await?
            .ok_or_else(|| SettlementError::user_not_found(query.user_id.clone()))?;

        let is_active = subscription.has_access(Timestamp::now());

        Ok(GetSubscriptionStatusResult {
            subscription,
            is_active,
        })
    }
}
