//! HTTP adapter for settlement endpoints.
//!
//! Exposes the payment settlement flows via REST API:
//! - `GET /api/billing/config` - Public gateway configuration
//! - `POST /api/billing/orders` - Create a one-time order
//! - `POST /api/billing/orders/capture` - Capture an approved order
//! - `POST /api/billing/subscriptions` - Start a recurring subscription
//! - `POST /api/billing/subscriptions/confirm` - Commit an approved subscription
//! - `GET /api/billing/subscriptions/status` - Current user's subscription
//! - `POST /api/billing/subscriptions/cancel` - Cancel subscription
//! - `GET /api/billing/access` - Check paid access
//! - `POST /api/webhooks/paypal` - Handle gateway webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AuthenticatedUser, GatewayPublicInfo, SettlementApiError, SettlementAppState};
pub use routes::{settlement_router, settlement_routes, webhook_routes};
