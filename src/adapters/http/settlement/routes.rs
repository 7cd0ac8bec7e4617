//! Axum router configuration for settlement endpoints.
//!
//! This module defines the route structure for billing-related API endpoints
//! and wires them to their corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, capture_order, check_access, confirm_subscription, create_order,
    create_subscription, get_gateway_config, get_subscription_status, handle_gateway_webhook,
    SettlementAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## Public Endpoints
/// - `GET /config` - Public gateway configuration (no secrets)
/// - `POST /orders` - Create a one-time order
///
/// ## User Endpoints (require caller identity)
/// - `POST /orders/capture` - Capture an approved order
/// - `POST /subscriptions` - Start a recurring subscription
/// - `POST /subscriptions/confirm` - Commit a buyer-approved subscription
/// - `GET /subscriptions/status` - Current user's subscription
/// - `POST /subscriptions/cancel` - Cancel the caller's subscription
/// - `GET /access` - Check if user has paid access
pub fn settlement_routes() -> Router<SettlementAppState> {
    Router::new()
        // Public endpoints
        .route("/config", get(get_gateway_config))
        .route("/orders", post(create_order))
        // User endpoints
        .route("/orders/capture", post(capture_order))
        .route("/subscriptions", post(create_subscription))
        .route("/subscriptions/confirm", post(confirm_subscription))
        .route("/subscriptions/status", get(get_subscription_status))
        .route("/subscriptions/cancel", post(cancel_subscription))
        .route("/access", get(check_access))
}

/// Create the gateway webhook router.
///
/// This is separate from the main billing routes because webhooks
/// don't carry user identity (they're verified via signature).
///
/// # Routes
/// - `POST /paypal` - Handle gateway webhooks
pub fn webhook_routes() -> Router<SettlementAppState> {
    Router::new().route("/paypal", post(handle_gateway_webhook))
}

/// Create the complete settlement module router.
///
/// Combines billing routes and webhook routes into a single router
/// suitable for mounting at `/api`.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use tollgate::adapters::http::settlement::{settlement_router, SettlementAppState};
///
/// let app_state = SettlementAppState::new(store, gateway, info);
/// let app = Router::new()
///     .nest("/api", settlement_router())
///     .with_state(app_state);
/// ```
pub fn settlement_router() -> Router<SettlementAppState> {
    Router::new()
        .nest("/billing", settlement_routes())
        .nest("/webhooks", webhook_routes())
}
