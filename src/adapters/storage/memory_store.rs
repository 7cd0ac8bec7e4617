//! In-memory entitlement store.
//!
//! Keeps user records in a shared HashMap. Nothing survives a restart,
//! which makes this the backend of choice for integration tests and
//! local experiments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::subscription::Subscription;
use crate::ports::{EntitlementStore, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryRecord {
    email: Option<String>,
    subscription: Subscription,
}

/// In-memory implementation of the entitlement store.
#[derive(Debug, Clone)]
pub struct InMemoryEntitlementStore {
    users: Arc<RwLock<HashMap<String, MemoryRecord>>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a user with the default inactive record.
    ///
    /// Mirrors what the account system does at signup; the store itself
    /// never creates users on write.
    pub async fn insert_user(&self, user_id: &UserId, email: Option<&str>) {
        let mut users = self.users.write().await;
        users.insert(
            user_id.as_str().to_string(),
            MemoryRecord {
                email: email.map(String::from),
                ..MemoryRecord::default()
            },
        );
    }

    /// Number of seeded users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for InMemoryEntitlementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(user_id.as_str()).map(|r| r.subscription.clone()))
    }

    async fn set(&self, user_id: &UserId, subscription: &Subscription) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(user_id.as_str())
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        record.subscription = subscription.clone();
        Ok(())
    }

    async fn find_user_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<UserId>, StoreError> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|(_, r)| r.subscription.subscription_id.as_deref() == Some(subscription_id))
            .map(|(id, _)| {
                UserId::new(id.clone())
                    .map_err(|e| StoreError::DatabaseError(format!("Invalid stored user id: {}", e)))
            })
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, StoreError> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|(_, r)| r.email.as_deref() == Some(email))
            .map(|(id, _)| {
                UserId::new(id.clone())
                    .map_err(|e| StoreError::DatabaseError(format!("Invalid stored user id: {}", e)))
            })
            .transpose()
    }
}
