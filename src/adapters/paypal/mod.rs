//! PayPal settlement gateway adapters.
//!
//! Implements the `SettlementGateway` port twice:
//! - `PayPalGateway`: real integration with the PayPal REST API
//!   (orders, billing plans, subscriptions, webhook verification)
//! - `SimulatedGateway`: local stand-in that settles everything
//!   without network calls
//!
//! The process selects one implementation at startup based on
//! configuration; handlers never branch on mode.

mod paypal_gateway;
mod simulated_gateway;
mod token_cache;
mod wire_types;

pub use paypal_gateway::{PayPalConfig, PayPalEnvironment, PayPalGateway};
pub use simulated_gateway::SimulatedGateway;
