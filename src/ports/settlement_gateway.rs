//! Settlement gateway port for external payment processing.
//!
//! Defines the contract for the payment gateway integration (PayPal or
//! the simulated stand-in). Implementations handle order settlement,
//! subscription lifecycle calls, and webhook signature verification.
//!
//! # Design
//!
//! - **One gateway per process**: The implementation is chosen once at
//!   startup and never switched per request
//! - **No store access**: Gateways talk to the provider only; callers
//!   persist results after the gateway call succeeds
//! - **Verification never fails the request**: `verify_webhook` reports
//!   an outcome instead of returning an error

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::SettlementError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for the settlement gateway.
///
/// Covers one-time order settlement and recurring subscription billing.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Stable name recorded on subscription records ("paypal" or
    /// "simulated").
    fn provider_name(&self) -> &'static str;

    /// Create a one-time order awaiting buyer approval.
    async fn create_order(&self, request: CreateOrderRequest)
        -> Result<OrderCreated, GatewayError>;

    /// Capture an approved order.
    async fn capture_order(&self, order_id: &str) -> Result<OrderCaptured, GatewayError>;

    /// Start a recurring subscription.
    ///
    /// Real gateways return an approval URL the buyer must visit;
    /// the simulated gateway activates immediately.
    async fn start_subscription(
        &self,
        request: StartSubscriptionRequest,
    ) -> Result<SubscriptionStarted, GatewayError>;

    /// Fetch the gateway's current view of a subscription.
    async fn confirm_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, GatewayError>;

    /// Verify a webhook delivery against the gateway.
    ///
    /// Always returns an outcome; verification trouble must not stop
    /// event processing.
    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &serde_json::Value,
    ) -> WebhookVerification;
}

/// Request to create a one-time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Amount as a decimal string (e.g., "9.99").
    pub amount: String,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Plan label attached to the order for later capture.
    pub plan_id: String,
}

/// A created order awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    /// Gateway order id.
    pub order_id: String,

    /// Gateway-reported order status (e.g., "CREATED").
    pub status: String,
}

/// Result of capturing an approved order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCaptured {
    /// Capture id, falling back to the order id when the gateway
    /// response carries no capture unit.
    pub capture_id: String,

    /// The order that was captured.
    pub order_id: String,

    /// Plan label recovered from the order.
    pub plan_id: String,

    /// Gateway-reported capture status (e.g., "COMPLETED").
    pub status: String,

    /// Raw gateway response, stored on the subscription record.
    pub raw: serde_json::Value,
}

/// Request to start a recurring subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSubscriptionRequest {
    /// Human-readable plan name (e.g., "monthly").
    pub plan_name: String,

    /// Price per billing cycle as a decimal string.
    pub price: String,

    /// ISO 4217 currency code.
    pub currency: String,
}

/// Outcome of starting a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubscriptionStarted {
    /// The buyer must approve the subscription at the gateway.
    PendingApproval {
        subscription_id: String,
        approve_url: String,
    },

    /// The subscription is already active (simulated gateway).
    Activated(SubscriptionState),
}

/// Gateway view of a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionState {
    /// Gateway subscription id.
    pub subscription_id: String,

    /// Billing plan the subscription runs on.
    pub plan_id: Option<String>,

    /// Gateway-native status string (e.g., "ACTIVE",
    /// "APPROVAL_PENDING").
    pub status: String,

    /// When the next charge is due.
    pub next_billing_time: Option<Timestamp>,

    /// Raw gateway response, stored on the subscription record.
    pub raw: serde_json::Value,
}

/// Webhook transmission headers used for signature verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookHeaders {
    pub transmission_id: Option<String>,
    pub transmission_time: Option<String>,
    pub transmission_sig: Option<String>,
    pub cert_url: Option<String>,
    pub auth_algo: Option<String>,
}

/// Outcome of webhook verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookVerification {
    /// Whether the gateway confirmed the delivery as authentic.
    pub verified: bool,

    /// Short explanation ("verified", "failed", "skipped", or an error
    /// description), used in logs and the webhook response.
    pub detail: String,
}

impl WebhookVerification {
    pub fn verified() -> Self {
        Self {
            verified: true,
            detail: "verified".to_string(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            verified: false,
            detail: detail.into(),
        }
    }

    /// Verification was not attempted (no webhook id configured, or
    /// the simulated gateway is in use).
    pub fn skipped() -> Self {
        Self {
            verified: false,
            detail: "skipped".to_string(),
        }
    }
}

/// Errors from settlement gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error name (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Timeout, message)
    }

    /// Create an invalid request error (gateway rejected the call).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    /// Create a provider error (gateway-side failure).
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    /// Create an invalid response error (unparseable gateway payload).
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for SettlementError {
    fn from(err: GatewayError) -> Self {
        match err.code {
            GatewayErrorCode::Timeout => SettlementError::GatewayTimeout,
            _ => SettlementError::gateway_rejected(err.to_string()),
        }
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Gateway did not answer in time.
    Timeout,

    /// Gateway rejected the request (4xx).
    InvalidRequest,

    /// Resource not found at the gateway.
    NotFound,

    /// Gateway-side failure (5xx).
    ProviderError,

    /// Response body could not be interpreted.
    InvalidResponse,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::ProviderError => "provider_error",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}
