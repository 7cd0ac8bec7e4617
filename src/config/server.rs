//! HTTP listener configuration.
//!
//! Bind address, deployment environment, log filter and the
//! request-level timeout applied by the router.

use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;

/// Settings for the HTTP listener and request pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, `0.0.0.0` by default
    #[serde(default = "default_bind_host")]
    pub host: String,

    /// TCP port the listener accepts on
    #[serde(default = "default_listen_port")]
    pub port: u16,

    /// Deployment environment, drives log format selection
    #[serde(default = "default_env")]
    pub environment: Environment,

    /// Tracing filter applied when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_level: String,

    /// Seconds before an inbound request is timed out
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Comma-separated CORS origin allowlist; unset means permissive
    pub cors_origins: Option<String>,
}

/// Deployment environment of the running process.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    /// Bind address assembled from host and port.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// True when deployed as production.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The origin allowlist split into entries. Blank entries from
    /// trailing commas are dropped.
    pub fn cors_origins_list(&self) -> Vec<String> {
        match &self.cors_origins {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Reject unusable listener settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        match self.request_timeout_secs {
            1..=300 => Ok(()),
            _ => Err(ValidationError::InvalidTimeout),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_listen_port(),
            environment: default_env(),
            log_level: default_log_filter(),
            request_timeout_secs: default_timeout_secs(),
            cors_origins: None,
        }
    }
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_log_filter() -> String {
    "info,tollgate=debug,sqlx=warn".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
