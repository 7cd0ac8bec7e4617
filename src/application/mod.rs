//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::settlement::{
    // Commands
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CaptureOrderCommand, CaptureOrderHandler, CaptureOrderResult,
    ConfirmSubscriptionCommand, ConfirmSubscriptionHandler, ConfirmSubscriptionResult,
    CreateOrderCommand, CreateOrderHandler, CreateOrderResult,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    StartSubscriptionCommand, StartSubscriptionHandler, StartSubscriptionResult,
    WebhookOutcome, WebhookStatsSnapshot,
    // Queries
    CheckAccessHandler, CheckAccessQuery, CheckAccessResult,
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, GetSubscriptionStatusResult,
};
