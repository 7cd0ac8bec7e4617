//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes and request handling
//! - `paypal` - Settlement gateway client (live and simulated)
//! - `storage` - Entitlement store backends (PostgreSQL, flat file, memory)

pub mod http;
pub mod paypal;
pub mod storage;
