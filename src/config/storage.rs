//! Entitlement storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Entitlement store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which persistence backend holds user entitlement records
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path of the JSON document used by the file backend
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

/// Available persistence backends
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    File,
}

impl StorageConfig {
    /// Check if the document database backend is selected
    pub fn is_postgres(&self) -> bool {
        self.backend == StorageBackend::Postgres
    }

    /// Check if the flat-file backend is selected
    pub fn is_file(&self) -> bool {
        self.backend == StorageBackend::File
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_file() && self.file_path.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "TOLLGATE__STORAGE__FILE_PATH",
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            file_path: default_file_path(),
        }
    }
}

fn default_file_path() -> String {
    "data/users.json".to_string()
}
