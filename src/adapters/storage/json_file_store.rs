//! Flat-file entitlement store.
//!
//! Persists every user record in a single JSON document on disk. Reads
//! and writes go through one process-wide lock and each write rewrites
//! the whole file, which is exactly as much machinery as a
//! single-instance deployment without a database needs.
//!
//! The file holds an array of user records. Records without a
//! `subscription` key read back as the default inactive record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::subscription::Subscription;
use crate::ports::{EntitlementStore, StoreError};

/// File-based implementation of the entitlement store.
#[derive(Debug)]
pub struct JsonFileStore {
    file_path: PathBuf,
    /// Serializes all file access. Held across read-modify-write so
    /// concurrent settlements cannot interleave partial rewrites.
    lock: Mutex<()>,
}

/// One user entry in the store file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserRecord {
    user_id: String,
    email: Option<String>,
    subscription: Subscription,
}

impl JsonFileStore {
    /// Create a new store backed by the given file path.
    ///
    /// The file does not need to exist yet; a missing file reads as an
    /// empty store.
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Load all records from disk. Callers must hold the lock.
    async fn load_records(&self) -> Result<Vec<UserRecord>, StoreError> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.file_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        serde_json::from_str(&contents)
            .map_err(|e| StoreError::DeserializationFailed(format!("Invalid store file: {}", e)))
    }

    /// Write all records back to disk. Callers must hold the lock.
    async fn store_records(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        // Pretty output keeps the file hand-editable for local setups
        let contents = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        tokio::fs::write(&self.file_path, contents)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))
    }
}

fn stored_user_id(raw: &str) -> Result<UserId, StoreError> {
    UserId::new(raw)
        .map_err(|e| StoreError::DeserializationFailed(format!("Invalid stored user id: {}", e)))
}

#[async_trait]
impl EntitlementStore for JsonFileStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.load_records().await?;

        Ok(records
            .into_iter()
            .find(|r| r.user_id == user_id.as_str())
            .map(|r| r.subscription))
    }

    async fn set(&self, user_id: &UserId, subscription: &Subscription) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load_records().await?;

        let record = records
            .iter_mut()
            .find(|r| r.user_id == user_id.as_str())
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        record.subscription = subscription.clone();

        self.store_records(&records).await
    }

    async fn find_user_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<UserId>, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.load_records().await?;

        records
            .iter()
            .find(|r| r.subscription.subscription_id.as_deref() == Some(subscription_id))
            .map(|r| stored_user_id(&r.user_id))
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.load_records().await?;

        records
            .iter()
            .find(|r| r.email.as_deref() == Some(email))
            .map(|r| stored_user_id(&r.user_id))
            .transpose()
    }
}
