//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `subscription` - Billing lifecycle, entitlement, and gateway events

pub mod foundation;
pub mod subscription;
