//! Environment-driven configuration.
//!
//! Settings are read from the process environment (plus a `.env` file in
//! development) via the `config` and `dotenvy` crates. Keys carry the
//! `TOLLGATE` prefix with `__` between nesting levels, so
//! `TOLLGATE__SERVER__PORT=4000` lands in `server.port`.
//!
//! ```no_run
//! use tollgate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("configuration did not load");
//! config.validate().expect("configuration is not runnable");
//!
//! println!("Listening on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod gateway;
mod server;
mod storage;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::{GatewayConfig, GatewayMode};
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Top-level settings tree.
///
/// Every section has serde defaults, so an empty environment still
/// deserializes; [`AppConfig::validate`] is what decides whether the
/// result is actually runnable.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Postgres pool settings, consulted only for the postgres backend.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Which entitlement store to run against.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Settlement gateway credentials and mode.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// A `.env` file is folded in first when one exists. Nested keys use
    /// double underscores: `TOLLGATE__DATABASE__URL`,
    /// `TOLLGATE__GATEWAY__SIMULATE`, and so on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value cannot be parsed into its
    /// typed field.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let source = config::Environment::default()
            .prefix("TOLLGATE")
            .separator("__");

        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Cross-check the loaded values.
    ///
    /// Sections validate themselves. The database section is skipped
    /// entirely when the file backend is selected, since no Postgres
    /// connection will be opened.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        if self.storage.is_postgres() {
            self.database.validate()?;
        }
        self.gateway.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global, so these tests take turns.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_KEYS: &[&str] = &[
        "TOLLGATE__DATABASE__URL",
        "TOLLGATE__GATEWAY__CLIENT_ID",
        "TOLLGATE__GATEWAY__CLIENT_SECRET",
        "TOLLGATE__SERVER__PORT",
        "TOLLGATE__SERVER__ENVIRONMENT",
        "TOLLGATE__STORAGE__BACKEND",
        "TOLLGATE__GATEWAY__SIMULATE",
    ];

    /// Runs `f` with exactly `vars` set, wiping every known key before
    /// and after.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in ALL_KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let out = f();
        for key in ALL_KEYS {
            env::remove_var(key);
        }
        out
    }

    const POSTGRES_ENV: &[(&str, &str)] = &[
        (
            "TOLLGATE__DATABASE__URL",
            "postgresql://tollgate@localhost/tollgate",
        ),
        ("TOLLGATE__GATEWAY__CLIENT_ID", "test-client"),
        ("TOLLGATE__GATEWAY__CLIENT_SECRET", "test-secret"),
    ];

    #[test]
    fn test_loads_a_postgres_setup_from_env() {
        let config = with_env(POSTGRES_ENV, AppConfig::load).unwrap();
        assert_eq!(config.database.url, "postgresql://tollgate@localhost/tollgate");
        assert!(config.gateway.has_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unset_sections_use_defaults() {
        let config = with_env(POSTGRES_ENV, AppConfig::load).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_nested_keys_reach_their_sections() {
        let mut vars = POSTGRES_ENV.to_vec();
        vars.push(("TOLLGATE__SERVER__PORT", "4000"));
        vars.push(("TOLLGATE__SERVER__ENVIRONMENT", "production"));

        let config = with_env(&vars, AppConfig::load).unwrap();
        assert_eq!(config.server.port, 4000);
        assert!(config.is_production());
    }

    #[test]
    fn test_file_backend_with_simulation_is_self_contained() {
        let vars = [
            ("TOLLGATE__STORAGE__BACKEND", "file"),
            ("TOLLGATE__GATEWAY__SIMULATE", "true"),
        ];

        let config = with_env(&vars, AppConfig::load).unwrap();
        assert!(config.storage.is_file());
        assert!(config.gateway.simulation_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_demands_a_database_url() {
        let config = with_env(&[], AppConfig::load).unwrap();
        assert!(config.storage.is_postgres());
        assert!(config.validate().is_err());
    }
}
