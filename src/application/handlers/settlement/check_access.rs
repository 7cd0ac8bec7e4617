//! CheckAccessHandler - Query handler for gating paid content.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::SettlementError;
use crate::ports::EntitlementStore;

/// Query to check if a user currently has paid-tier access.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,
}

/// Result of the access check.
#[derive(Debug, Clone)]
pub struct CheckAccessResult {
    pub has_access: bool,
}

/// Handler for entitlement checks.
///
/// This is the hot path called before serving paid content. Unknown
/// users simply have no access; only store failures are errors.
pub struct CheckAccessHandler {
    store: Arc<dyn EntitlementStore>,
}

impl CheckAccessHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<CheckAccessResult, SettlementError> {
        let has_access = self
            .store
            .get(&query.user_id)
            .await?
            .map(|subscription| subscription.has_access(Timestamp::now()))
            .unwrap_or(false);

        Ok(CheckAccessResult { has_access })
    }
}
