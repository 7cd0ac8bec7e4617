//! Configuration failure types.

use thiserror::Error;

/// Failure while assembling the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration rejected: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A setting that parsed but cannot be run with.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("Listener port must be nonzero")]
    InvalidPort,

    #[error("Request timeout out of range")]
    InvalidTimeout,

    #[error("Database URL must use a postgres scheme")]
    InvalidDatabaseUrl,

    #[error("min_connections cannot exceed max_connections")]
    InvalidPoolSize,

    #[error("max_connections above the supported cap of 100")]
    PoolSizeTooLarge,

    #[error("Gateway timeout out of range")]
    InvalidGatewayTimeout,

    #[error("Redirect URLs must be absolute http(s) URLs")]
    InvalidRedirectUrl,
}
