//! Subscription domain module.
//!
//! Handles the billing lifecycle, entitlement checks, and gateway
//! webhook events.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription record entity
//! - `status` - SubscriptionStatus state machine
//! - `events` - Gateway webhook event envelope
//! - `errors` - Settlement error types

mod aggregate;
mod errors;
mod events;
mod status;

pub use aggregate::{Activation, EventDisposition, SettlementUpdate, Subscription};
pub use errors::SettlementError;
pub use events::{BillingInfo, EventResource, GatewayEvent, Subscriber};
pub use status::SubscriptionStatus;
