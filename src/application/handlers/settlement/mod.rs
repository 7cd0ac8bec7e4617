//! Settlement handlers.
//!
//! Command and query handlers for the payment settlement lifecycle including:
//!
//! ## Commands
//! - Creating and capturing one-time orders
//! - Starting and confirming recurring subscriptions
//! - Cancelling subscriptions
//! - Processing gateway webhooks
//!
//! ## Queries
//! - Get subscription status
//! - Check paid access

mod cancel_subscription;
mod capture_order;
mod check_access;
mod confirm_subscription;
mod create_order;
mod get_subscription_status;
mod process_webhook;
mod start_subscription;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use capture_order::{CaptureOrderCommand, CaptureOrderHandler, CaptureOrderResult};
pub use confirm_subscription::{
    ConfirmSubscriptionCommand, ConfirmSubscriptionHandler, ConfirmSubscriptionResult,
};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use process_webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult, WebhookOutcome,
    WebhookStatsSnapshot,
};
pub use start_subscription::{
    StartSubscriptionCommand, StartSubscriptionHandler, StartSubscriptionResult,
};

// Queries
pub use check_access::{CheckAccessHandler, CheckAccessQuery, CheckAccessResult};
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, GetSubscriptionStatusResult,
};
