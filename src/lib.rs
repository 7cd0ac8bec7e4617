//! Tollgate - Subscription and Settlement Service
//!
//! This crate implements PayPal-backed order settlement and subscription
//! billing with a pluggable entitlement store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
