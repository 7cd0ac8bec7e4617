//! HTTP handlers for settlement endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::settlement::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CaptureOrderCommand, CaptureOrderHandler,
    CheckAccessHandler, CheckAccessQuery, ConfirmSubscriptionCommand, ConfirmSubscriptionHandler,
    CreateOrderCommand, CreateOrderHandler, GetSubscriptionStatusHandler,
    GetSubscriptionStatusQuery, ProcessWebhookCommand, ProcessWebhookHandler,
    StartSubscriptionCommand, StartSubscriptionHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::subscription::SettlementError;
use crate::ports::{EntitlementStore, SettlementGateway, WebhookHeaders};

use super::dto::{
    AccessCheckResponse, CaptureOrderRequest, CaptureOrderResponse, ConfirmSubscriptionRequest,
    ConfirmSubscriptionResponse, CreateOrderRequest, CreateOrderResponse,
    CreateSubscriptionRequest, CreateSubscriptionResponse, ErrorResponse, GatewayConfigResponse,
    SubscriptionStatusResponse, SubscriptionViewResponse, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Public gateway facts exposed by the configuration endpoint.
///
/// Assembled at startup from the gateway configuration; holds no secrets.
#[derive(Debug, Clone)]
pub struct GatewayPublicInfo {
    /// Target environment ("sandbox" or "live").
    pub environment: String,
    /// Whether live gateway credentials are configured.
    pub configured: bool,
    /// Whether the simulated gateway is active.
    pub simulation: bool,
    /// Public OAuth2 client id, if configured.
    pub client_id: Option<String>,
}

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct SettlementAppState {
    pub entitlement_store: Arc<dyn EntitlementStore>,
    pub settlement_gateway: Arc<dyn SettlementGateway>,
    /// Long-lived so its counters span requests.
    pub webhook_processor: Arc<ProcessWebhookHandler>,
    pub gateway_info: GatewayPublicInfo,
}

impl SettlementAppState {
    /// Build the state, wiring the webhook processor to the same store
    /// and gateway used by the request handlers.
    pub fn new(
        entitlement_store: Arc<dyn EntitlementStore>,
        settlement_gateway: Arc<dyn SettlementGateway>,
        gateway_info: GatewayPublicInfo,
    ) -> Self {
        let webhook_processor = Arc::new(ProcessWebhookHandler::new(
            entitlement_store.clone(),
            settlement_gateway.clone(),
        ));
        Self {
            entitlement_store,
            settlement_gateway,
            webhook_processor,
            gateway_info,
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.settlement_gateway.clone())
    }

    pub fn capture_order_handler(&self) -> CaptureOrderHandler {
        CaptureOrderHandler::new(
            self.entitlement_store.clone(),
            self.settlement_gateway.clone(),
        )
    }

    pub fn start_subscription_handler(&self) -> StartSubscriptionHandler {
        StartSubscriptionHandler::new(
            self.entitlement_store.clone(),
            self.settlement_gateway.clone(),
        )
    }

    pub fn confirm_subscription_handler(&self) -> ConfirmSubscriptionHandler {
        ConfirmSubscriptionHandler::new(
            self.entitlement_store.clone(),
            self.settlement_gateway.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.entitlement_store.clone())
    }

    pub fn status_handler(&self) -> GetSubscriptionStatusHandler {
        GetSubscriptionStatusHandler::new(self.entitlement_store.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.entitlement_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// In production, this would be extracted from JWT/session by auth middleware.
/// For now, uses a header-based extraction for development/testing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // In production, this would validate JWT token from Authorization header
        // For development, we accept an X-User-Id header
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/billing/config - Public gateway configuration
pub async fn get_gateway_config(
    State(state): State<SettlementAppState>,
) -> Json<GatewayConfigResponse> {
    let info = &state.gateway_info;
    Json(GatewayConfigResponse {
        gateway: state.settlement_gateway.provider_name().to_string(),
        environment: info.environment.clone(),
        configured: info.configured,
        simulation: info.simulation,
        client_id: info.client_id.clone(),
    })
}

/// GET /api/billing/subscriptions/status - Current user's subscription
pub async fn get_subscription_status(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.status_handler();
    let query = GetSubscriptionStatusQuery {
        user_id: user.user_id,
    };

    let result = handler.handle(query).await?;

    let response = SubscriptionStatusResponse {
        subscription: SubscriptionViewResponse::from(result.subscription),
        is_active: result.is_active,
    };

    Ok(Json(response))
}

/// GET /api/billing/access - Check if user has paid access
pub async fn check_access(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.check_access_handler();
    let query = CheckAccessQuery {
        user_id: user.user_id,
    };

    let result = handler.handle(query).await?;

    let response = AccessCheckResponse {
        has_access: result.has_access,
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/billing/orders - Create a one-time order
///
/// No caller identity: an order is not tied to a user until it is captured.
pub async fn create_order(
    State(state): State<SettlementAppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.create_order_handler();
    let cmd = CreateOrderCommand {
        plan_id: request.plan_id,
        amount: request.amount,
        currency: request.currency,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse::from(result))))
}

/// POST /api/billing/orders/capture - Capture an approved order
pub async fn capture_order(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CaptureOrderRequest>,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.capture_order_handler();
    let cmd = CaptureOrderCommand {
        user_id: user.user_id,
        order_id: request.order_id,
    };

    let result = handler.handle(cmd).await?;

    let response = CaptureOrderResponse {
        capture_id: result.capture_id,
        status: result.status,
        subscription: SubscriptionViewResponse::from(result.subscription),
    };

    Ok(Json(response))
}

/// POST /api/billing/subscriptions - Start a recurring subscription
pub async fn create_subscription(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.start_subscription_handler();
    let cmd = StartSubscriptionCommand {
        user_id: user.user_id,
        plan_name: request.plan_name,
        price: request.price,
        currency: request.currency,
    };

    let result = handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSubscriptionResponse::from(result)),
    ))
}

/// POST /api/billing/subscriptions/confirm - Commit a buyer-approved subscription
pub async fn confirm_subscription(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Json(request): Json<ConfirmSubscriptionRequest>,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.confirm_subscription_handler();
    let cmd = ConfirmSubscriptionCommand {
        user_id: user.user_id,
        subscription_id: request.subscription_id,
    };

    let result = handler.handle(cmd).await?;

    let response = ConfirmSubscriptionResponse {
        subscription: SubscriptionViewResponse::from(result.subscription),
    };

    Ok(Json(response))
}

/// POST /api/billing/subscriptions/cancel - Cancel the caller's subscription
///
/// Remaining paid time is kept; the record stops renewing.
pub async fn cancel_subscription(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, SettlementApiError> {
    let handler = state.cancel_subscription_handler();
    let cmd = CancelSubscriptionCommand {
        user_id: user.user_id,
    };

    handler.handle(cmd).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/webhooks/paypal - Handle gateway webhook events
///
/// Always acknowledges with 200: the gateway retries on other statuses,
/// and a structurally failing handler would cause retry storms.
pub async fn handle_gateway_webhook(
    State(state): State<SettlementAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    // An unparseable body is still acknowledged
    let payload: serde_json::Value =
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    let cmd = ProcessWebhookCommand {
        headers: webhook_headers(&headers),
        body: payload,
    };

    let result = state.webhook_processor.handle(cmd).await;

    (
        StatusCode::OK,
        Json(WebhookAckResponse {
            received: true,
            verified: result.verified,
        }),
    )
}

/// Map the provider's transmission headers onto the verification input.
fn webhook_headers(headers: &HeaderMap) -> WebhookHeaders {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    WebhookHeaders {
        transmission_id: value("paypal-transmission-id"),
        transmission_time: value("paypal-transmission-time"),
        transmission_sig: value("paypal-transmission-sig"),
        cert_url: value("paypal-cert-url"),
        auth_algo: value("paypal-auth-algo"),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts settlement errors to HTTP responses.
pub struct SettlementApiError(SettlementError);

impl From<SettlementError> for SettlementApiError {
    fn from(err: SettlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SettlementApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            SettlementError::UserNotFound(_) => StatusCode::NOT_FOUND,
            SettlementError::InvalidState { .. } => StatusCode::CONFLICT,
            SettlementError::NotActivatable { .. } => StatusCode::BAD_REQUEST,
            SettlementError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            SettlementError::GatewayRejected { .. } => StatusCode::BAD_GATEWAY,
            SettlementError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            SettlementError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
