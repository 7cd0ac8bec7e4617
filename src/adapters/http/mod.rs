//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure.

pub mod settlement;

// Re-export key types for convenience
pub use settlement::settlement_router;
pub use settlement::SettlementAppState;
