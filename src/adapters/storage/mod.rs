//! Storage Adapters
//!
//! Implementations of the EntitlementStore port for persisting user
//! subscription records.
//!
//! ## Available Adapters
//!
//! - **PostgresEntitlementStore** - JSONB column on the users table
//! - **JsonFileStore** - Single JSON file on disk (no-database deployments)
//! - **InMemoryEntitlementStore** - HashMap-backed (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{JsonFileStore, PostgresEntitlementStore};
//!
//! // Production: PostgreSQL
//! let store = PostgresEntitlementStore::new(pool);
//!
//! // Single instance without a database: flat file
//! let store = JsonFileStore::new("./data/users.json");
//! ```

mod json_file_store;
mod memory_store;
mod postgres_store;

pub use json_file_store::JsonFileStore;
pub use memory_store::InMemoryEntitlementStore;
pub use postgres_store::PostgresEntitlementStore;
