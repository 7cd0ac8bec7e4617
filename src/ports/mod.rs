//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Gateway Ports
//!
//! - `SettlementGateway` - Order settlement and subscription billing
//!
//! ## Storage Ports
//!
//! - `EntitlementStore` - User subscription record persistence

mod entitlement_store;
mod settlement_gateway;

pub use entitlement_store::{EntitlementStore, StoreError};
pub use settlement_gateway::{
    CreateOrderRequest, GatewayError, GatewayErrorCode, OrderCaptured, OrderCreated,
    SettlementGateway, StartSubscriptionRequest, SubscriptionStarted, SubscriptionState,
    WebhookHeaders, WebhookVerification,
};
