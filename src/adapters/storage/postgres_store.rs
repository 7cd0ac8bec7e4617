//! PostgreSQL-backed entitlement store.
//!
//! Each user's subscription record lives in a JSONB `subscription`
//! column on the `users` table. Account rows are owned by the platform's
//! user system; this adapter only reads and replaces the subscription
//! document, it never inserts users.
//!
//! Webhook lookups lean on an expression index over
//! `subscription->>'subscription_id'` (see the migration).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::domain::subscription::Subscription;
use crate::ports::{EntitlementStore, StoreError};

/// PostgreSQL implementation of the entitlement store.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row holding a user's subscription document.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    #[allow(dead_code)]
    id: Uuid,
    subscription: serde_json::Value,
}

/// Database row carrying only a user identifier.
#[derive(Debug, sqlx::FromRow)]
struct UserIdRow {
    user_id: String,
}

/// Decode a stored JSONB document into a subscription record.
///
/// An empty document (`{}`) decodes to the default inactive record, so
/// users provisioned before their first purchase read back cleanly.
fn decode_subscription(value: serde_json::Value) -> Result<Subscription, StoreError> {
    serde_json::from_value(value).map_err(|e| {
        StoreError::DeserializationFailed(format!("Invalid subscription document: {}", e))
    })
}

fn parse_user_id(raw: String) -> Result<UserId, StoreError> {
    UserId::new(raw).map_err(|e| StoreError::DatabaseError(format!("Invalid stored user id: {}", e)))
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, subscription
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Failed to load subscription: {}", e)))?;

        row.map(|r| decode_subscription(r.subscription)).transpose()
    }

    async fn set(&self, user_id: &UserId, subscription: &Subscription) -> Result<(), StoreError> {
        let document = serde_json::to_value(subscription)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET subscription = $2, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Failed to store subscription: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user_id.clone()));
        }

        Ok(())
    }

    async fn find_user_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<UserId>, StoreError> {
        let row: Option<UserIdRow> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM users
            WHERE subscription->>'subscription_id' = $1
            "#,
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            StoreError::DatabaseError(format!("Failed to find user by subscription: {}", e))
        })?;

        row.map(|r| parse_user_id(r.user_id)).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, StoreError> {
        let row: Option<UserIdRow> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Failed to find user by email: {}", e)))?;

        row.map(|r| parse_user_id(r.user_id)).transpose()
    }
}
