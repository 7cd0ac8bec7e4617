//! HTTP DTOs (Data Transfer Objects) for settlement endpoints.
//!
//! These types define the JSON request/response structure for the billing API.
//! They serve as the boundary between HTTP and the application layer.

use crate::application::handlers::settlement::{
    CreateOrderResult, StartSubscriptionResult,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a one-time order.
///
/// All fields are optional; omitted values fall back to the standard
/// single-purchase offer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Plan label attached to the order.
    #[serde(default = "default_order_plan")]
    pub plan_id: String,
    /// Amount as a decimal string.
    #[serde(default = "default_amount")]
    pub amount: String,
    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Request to capture an approved order.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureOrderRequest {
    /// Gateway order id returned by order creation.
    pub order_id: String,
}

/// Request to start a recurring subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Plan name shown to the buyer.
    #[serde(default = "default_plan_name")]
    pub plan_name: String,
    /// Price per billing cycle as a decimal string.
    #[serde(default = "default_amount")]
    pub price: String,
    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Request to confirm a buyer-approved subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmSubscriptionRequest {
    /// Gateway subscription id from the approval redirect.
    pub subscription_id: String,
}

fn default_order_plan() -> String {
    "default".to_string()
}

fn default_plan_name() -> String {
    "monthly".to_string()
}

fn default_amount() -> String {
    "9.99".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Public gateway facts for client bootstrap.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfigResponse {
    /// Provider in use ("paypal" or "simulated").
    pub gateway: String,
    /// Target environment ("sandbox" or "live").
    pub environment: String,
    /// Whether live gateway credentials are configured.
    pub configured: bool,
    /// Whether the simulated gateway is active.
    pub simulation: bool,
    /// Public OAuth2 client id, if any. Never the secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Sanitized subscription projection for API responses.
///
/// Raw gateway payloads stay in the record's metadata and are never
/// serialized here.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionViewResponse {
    /// Provider that settled the subscription.
    pub provider: Option<String>,
    /// Billing plan.
    pub plan_id: Option<String>,
    /// Gateway subscription or capture id.
    pub subscription_id: Option<String>,
    /// Current lifecycle status.
    pub status: SubscriptionStatus,
    /// End of the paid period (ISO 8601).
    pub current_period_end: Option<String>,
}

impl From<Subscription> for SubscriptionViewResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            provider: subscription.provider,
            plan_id: subscription.plan_id,
            subscription_id: subscription.subscription_id,
            status: subscription.status,
            current_period_end: subscription.current_period_end.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response for order creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    /// Gateway order id, needed for the capture call.
    pub order_id: String,
    /// Gateway-reported order status.
    pub status: String,
}

impl From<CreateOrderResult> for CreateOrderResponse {
    fn from(result: CreateOrderResult) -> Self {
        Self {
            order_id: result.order_id,
            status: result.status,
        }
    }
}

/// Response for order capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureOrderResponse {
    /// Capture id recorded on the subscription.
    pub capture_id: String,
    /// Gateway-reported capture status.
    pub status: String,
    /// The activated subscription.
    pub subscription: SubscriptionViewResponse,
}

/// Response for subscription creation.
///
/// Either an approval redirect (live gateway) or the already-active
/// subscription (simulation).
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscriptionResponse {
    /// Gateway subscription id.
    pub subscription_id: Option<String>,
    /// URL the buyer must visit to approve the subscription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_url: Option<String>,
    /// Present when the subscription activated without approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionViewResponse>,
}

impl From<StartSubscriptionResult> for CreateSubscriptionResponse {
    fn from(result: StartSubscriptionResult) -> Self {
        match result {
            StartSubscriptionResult::PendingApproval {
                subscription_id,
                approve_url,
            } => Self {
                subscription_id: Some(subscription_id),
                approve_url: Some(approve_url),
                subscription: None,
            },
            StartSubscriptionResult::Activated { subscription } => Self {
                subscription_id: subscription.subscription_id.clone(),
                approve_url: None,
                subscription: Some(SubscriptionViewResponse::from(subscription)),
            },
        }
    }
}

/// Response for subscription confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmSubscriptionResponse {
    /// The committed subscription.
    pub subscription: SubscriptionViewResponse,
}

/// Response for the status query.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    /// The caller's subscription record.
    pub subscription: SubscriptionViewResponse,
    /// Whether the record currently grants paid access.
    pub is_active: bool,
}

/// Response for access check.
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResponse {
    /// Whether the user has access.
    pub has_access: bool,
}

/// Acknowledgement returned for every webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    /// Always true; the delivery reached the service.
    pub received: bool,
    /// Whether signature verification succeeded.
    pub verified: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details.
    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
