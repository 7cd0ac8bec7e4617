//! Entitlement store port.
//!
//! Defines the contract for persisting user subscription records.
//! Implementations exist for PostgreSQL and for a flat JSON file; the
//! backend is chosen once at startup.
//!
//! # Design
//!
//! - **One record per user**: `set` replaces the whole record, there
//!   are no partial updates
//! - **Users are not created here**: account provisioning belongs to
//!   the platform's user system; `set` on an unknown user reports
//!   `StoreError::NotFound`
//! - **Webhook lookups**: Events are matched to users by gateway
//!   subscription id first, then by buyer email
//!
//! # Example
//!
//! ```ignore
//! async fn cancel(
//!     store: &dyn EntitlementStore,
//!     user_id: &UserId,
//! ) -> Result<(), StoreError> {
//!     let mut subscription = store.get(user_id).await?.unwrap_or_default();
//!     subscription.cancel().ok();
//!     store.set(user_id, &subscription).await
//! }
//! ```

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SettlementError, Subscription};
use async_trait::async_trait;

/// Errors that can occur during entitlement store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User record not found: {0}")]
    NotFound(UserId),

    #[error("Failed to serialize record: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize record: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for SettlementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(user_id) => SettlementError::user_not_found(user_id),
            other => SettlementError::infrastructure(other.to_string()),
        }
    }
}

/// Port for persisting user subscription records.
///
/// Implementations must ensure:
/// - One record per user
/// - Whole-record replacement on write
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Load the subscription record for a user.
    ///
    /// Returns `None` if the user is unknown to the store. A known
    /// user that never settled a payment gets the defaulted record.
    async fn get(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError>;

    /// Replace the subscription record for an existing user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user does not exist,
    /// other variants on persistence failure.
    async fn set(&self, user_id: &UserId, subscription: &Subscription) -> Result<(), StoreError>;

    /// Find the user owning a gateway subscription id.
    ///
    /// Primary lookup used to route webhook events.
    async fn find_user_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<UserId>, StoreError>;

    /// Find a user by stored email address.
    ///
    /// Fallback lookup when an event carries no known subscription id.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, StoreError>;
}
