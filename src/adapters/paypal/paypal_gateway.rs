//! PayPal settlement gateway adapter.
//!
//! Implements the `SettlementGateway` port against the PayPal REST API:
//! OAuth2 client-credentials tokens (cached per environment), one-time
//! checkout orders, catalog product and billing plan provisioning,
//! recurring subscriptions, and webhook signature verification.
//!
//! # Configuration
//!
//! ```ignore
//! let config = PayPalConfig::new(client_id, client_secret)
//!     .with_environment(PayPalEnvironment::Live)
//!     .with_webhook_id("WH-123");
//! let gateway = PayPalGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CreateOrderRequest, GatewayError, GatewayErrorCode, OrderCaptured, OrderCreated,
    SettlementGateway, StartSubscriptionRequest, SubscriptionStarted, SubscriptionState,
    WebhookHeaders, WebhookVerification,
};

use super::token_cache::TokenCache;
use super::wire_types::{
    ApplicationContext, BillingCycleRequest, CaptureOrderResponse, CreateOrderBody,
    CreatePlanBody, CreateProductBody, CreateSubscriptionBody, FrequencyRequest, LinkDescription,
    Money, OrderResponse, PaymentPreferencesRequest, PlanResponse, PricingSchemeRequest,
    ProductResponse, PurchaseUnitRequest, SubscriptionResponse, TokenResponse, VerifyWebhookBody,
    VerifyWebhookResponse,
};

/// Default request timeout for gateway calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Plan label used when a capture response carries no correlation tag.
const DEFAULT_CAPTURE_PLAN: &str = "paypal-subscription";

/// PayPal API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayPalEnvironment {
    /// Sandbox API (test transactions only).
    #[default]
    Sandbox,

    /// Live API (real money).
    Live,
}

impl PayPalEnvironment {
    /// Base URL for this environment.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            PayPalEnvironment::Sandbox => "https://api-m.sandbox.paypal.com",
            PayPalEnvironment::Live => "https://api-m.paypal.com",
        }
    }
}

/// PayPal API configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    /// OAuth2 client id. Public; exposed to buyers through the
    /// configuration endpoint.
    client_id: String,

    /// OAuth2 client secret.
    client_secret: SecretString,

    /// Target environment, selects the base URL.
    environment: PayPalEnvironment,

    /// Base URL for API calls (overridable for tests).
    api_base_url: String,

    /// Webhook id issued by PayPal; verification is skipped without it.
    webhook_id: Option<String>,

    /// Pre-provisioned catalog product id, reused instead of created.
    product_id: Option<String>,

    /// Pre-provisioned billing plan id, reused instead of created.
    plan_id: Option<String>,

    /// Brand shown on the PayPal approval page.
    brand_name: String,

    /// Redirect after the buyer approves.
    return_url: String,

    /// Redirect after the buyer abandons approval.
    cancel_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl PayPalConfig {
    /// Create a configuration with sandbox defaults.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let environment = PayPalEnvironment::Sandbox;
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            environment,
            api_base_url: environment.api_base_url().to_string(),
            webhook_id: None,
            product_id: None,
            plan_id: None,
            brand_name: "Tollgate".to_string(),
            return_url: "http://localhost:3000/billing/return".to_string(),
            cancel_url: "http://localhost:3000/billing/cancel".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Select the API environment.
    pub fn with_environment(mut self, environment: PayPalEnvironment) -> Self {
        self.environment = environment;
        self.api_base_url = environment.api_base_url().to_string();
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the webhook id used for signature verification.
    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    /// Reuse a pre-provisioned catalog product.
    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Reuse a pre-provisioned billing plan.
    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Set the brand name shown during approval.
    pub fn with_brand_name(mut self, brand_name: impl Into<String>) -> Self {
        self.brand_name = brand_name.into();
        self
    }

    /// Set the approval redirect URLs.
    pub fn with_redirect_urls(
        mut self,
        return_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.return_url = return_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// PayPal settlement gateway.
///
/// Holds one HTTP client and one token cache; safe to share behind an
/// `Arc` across request handlers.
pub struct PayPalGateway {
    config: PayPalConfig,
    http_client: reqwest::Client,
    token_cache: TokenCache,
}

impl PayPalGateway {
    /// Create a gateway with the given configuration.
    pub fn new(config: PayPalConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
            token_cache: TokenCache::new(),
        }
    }

    /// Obtain a bearer token, preferring the cache.
    async fn access_token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self
            .token_cache
            .get(self.config.environment, Timestamp::now())
            .await
        {
            return Ok(token);
        }

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let token: TokenResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse token response: {}", e))
        })?;

        self.token_cache
            .put(
                self.config.environment,
                token.access_token.clone(),
                token.expires_in,
                Timestamp::now(),
            )
            .await;

        tracing::debug!(expires_in = token.expires_in, "Obtained gateway access token");
        Ok(token.access_token)
    }

    /// Map transport-level failures to typed errors.
    fn map_request_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::timeout(format!(
                "Gateway did not respond within {}s",
                self.config.timeout.as_secs()
            ))
        } else if err.is_connect() {
            GatewayError::network(format!("Connection failed: {}", err))
        } else {
            GatewayError::network(err.to_string())
        }
    }

    /// Pass successful responses through, map the rest to typed errors.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %error_body, "Gateway request failed");

        let err = match status.as_u16() {
            401 | 403 => GatewayError::authentication(format!(
                "Gateway rejected credentials: {}",
                error_body
            )),
            404 => GatewayError::new(
                GatewayErrorCode::NotFound,
                format!("Gateway resource not found: {}", error_body),
            ),
            400..=499 => {
                GatewayError::invalid_request(format!("Gateway rejected request: {}", error_body))
            }
            500..=599 => GatewayError::provider(format!(
                "Gateway server error {}: {}",
                status, error_body
            )),
            _ => GatewayError::network(format!("Unexpected status {}: {}", status, error_body)),
        };

        match error_name(&error_body) {
            Some(name) => Err(err.with_provider_code(name)),
            None => Err(err),
        }
    }

    /// Return the configured product id or create a catalog product.
    async fn ensure_product(&self, token: &str) -> Result<String, GatewayError> {
        if let Some(id) = &self.config.product_id {
            return Ok(id.clone());
        }

        let url = format!("{}/v1/catalogs/products", self.config.api_base_url);
        let body = CreateProductBody {
            name: self.config.brand_name.clone(),
            description: format!("Subscription product for {}", self.config.brand_name),
            product_type: "SERVICE".to_string(),
            category: "SOFTWARE".to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let product: ProductResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse product response: {}", e))
        })?;

        tracing::info!(product_id = %product.id, "Created gateway catalog product");
        Ok(product.id)
    }

    /// Return the configured plan id or create a monthly billing plan.
    ///
    /// Freshly created plans in `CREATED` status get a best-effort
    /// activation call; a failed activation is logged and ignored.
    async fn ensure_plan(
        &self,
        token: &str,
        product_id: &str,
        request: &StartSubscriptionRequest,
    ) -> Result<String, GatewayError> {
        if let Some(id) = &self.config.plan_id {
            return Ok(id.clone());
        }

        let url = format!("{}/v1/billing/plans", self.config.api_base_url);
        let body = CreatePlanBody {
            product_id: product_id.to_string(),
            name: format!("Monthly {} {}", request.price, request.currency),
            billing_cycles: vec![BillingCycleRequest {
                frequency: FrequencyRequest {
                    interval_unit: "MONTH".to_string(),
                    interval_count: 1,
                },
                tenure_type: "REGULAR".to_string(),
                sequence: 1,
                total_cycles: 0,
                pricing_scheme: PricingSchemeRequest {
                    fixed_price: Money {
                        currency_code: request.currency.clone(),
                        value: request.price.clone(),
                    },
                },
            }],
            payment_preferences: PaymentPreferencesRequest {
                auto_bill_outstanding: true,
                setup_fee: Money {
                    currency_code: request.currency.clone(),
                    value: "0".to_string(),
                },
                setup_fee_failure_action: "CONTINUE".to_string(),
                payment_failure_threshold: 3,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let plan: PlanResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse plan response: {}", e))
        })?;

        if plan.status.as_deref() == Some("CREATED") {
            let activate_url = format!(
                "{}/v1/billing/plans/{}/activate",
                self.config.api_base_url, plan.id
            );
            match self
                .http_client
                .post(&activate_url)
                .bearer_auth(token)
                .json(&serde_json::json!({}))
                .send()
                .await
            {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(
                        plan_id = %plan.id,
                        status = %response.status(),
                        "Plan activation request rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(plan_id = %plan.id, error = %e, "Plan activation request failed");
                }
                Ok(_) => {}
            }
        }

        tracing::info!(plan_id = %plan.id, "Created gateway billing plan");
        Ok(plan.id)
    }
}

#[async_trait]
impl SettlementGateway for PayPalGateway {
    fn provider_name(&self) -> &'static str {
        "paypal"
    }

    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, GatewayError> {
        let token = self.access_token().await?;

        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);
        let body = CreateOrderBody {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![PurchaseUnitRequest {
                amount: Money {
                    currency_code: request.currency.clone(),
                    value: request.amount.clone(),
                },
                custom_id: request.plan_id.clone(),
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let order: OrderResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse order response: {}", e))
        })?;

        tracing::info!(order_id = %order.id, plan_id = %request.plan_id, "Created gateway order");
        Ok(OrderCreated {
            order_id: order.id,
            status: order.status,
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<OrderCaptured, GatewayError> {
        let token = self.access_token().await?;

        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, order_id
        );
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse capture response: {}", e))
        })?;

        let captured = capture_from_response(order_id, raw);
        tracing::info!(
            order_id = %order_id,
            capture_id = %captured.capture_id,
            "Captured gateway order"
        );
        Ok(captured)
    }

    async fn start_subscription(
        &self,
        request: StartSubscriptionRequest,
    ) -> Result<SubscriptionStarted, GatewayError> {
        let token = self.access_token().await?;

        let product_id = self.ensure_product(&token).await?;
        let plan_id = self.ensure_plan(&token, &product_id, &request).await?;

        let url = format!("{}/v1/billing/subscriptions", self.config.api_base_url);
        let body = CreateSubscriptionBody {
            plan_id: plan_id.clone(),
            application_context: ApplicationContext {
                brand_name: self.config.brand_name.clone(),
                locale: "en-US".to_string(),
                return_url: self.config.return_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse subscription response: {}", e))
        })?;

        let parsed: SubscriptionResponse = serde_json::from_value(raw).unwrap_or_default();
        let subscription_id = parsed.id.clone().ok_or_else(|| {
            GatewayError::invalid_response("Subscription response carried no id")
        })?;
        let approve_url = approve_link(&parsed.links).ok_or_else(|| {
            GatewayError::invalid_response("Subscription response carried no approve link")
        })?;

        tracing::info!(
            subscription_id = %subscription_id,
            plan_id = %plan_id,
            "Created gateway subscription awaiting approval"
        );
        Ok(SubscriptionStarted::PendingApproval {
            subscription_id,
            approve_url,
        })
    }

    async fn confirm_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, GatewayError> {
        let token = self.access_token().await?;

        let url = format!(
            "{}/v1/billing/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_status(response).await?;

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse subscription response: {}", e))
        })?;

        let state = subscription_state(subscription_id, raw);
        tracing::debug!(
            subscription_id = %state.subscription_id,
            status = %state.status,
            "Fetched gateway subscription"
        );
        Ok(state)
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &serde_json::Value,
    ) -> WebhookVerification {
        let Some(webhook_id) = self.config.webhook_id.clone() else {
            tracing::warn!("Webhook verification skipped: no webhook id configured");
            return WebhookVerification::skipped();
        };

        let (
            Some(transmission_id),
            Some(transmission_time),
            Some(transmission_sig),
            Some(cert_url),
            Some(auth_algo),
        ) = (
            headers.transmission_id.clone(),
            headers.transmission_time.clone(),
            headers.transmission_sig.clone(),
            headers.cert_url.clone(),
            headers.auth_algo.clone(),
        )
        else {
            tracing::warn!("Webhook verification failed: missing transmission headers");
            return WebhookVerification::failed("missing transmission headers");
        };

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Webhook verification could not obtain a token");
                return WebhookVerification::failed(format!("verification error: {}", e));
            }
        };

        let url = format!(
            "{}/v1/notifications/verify-webhook-signature",
            self.config.api_base_url
        );
        let body = VerifyWebhookBody {
            transmission_id,
            transmission_time,
            cert_url,
            auth_algo,
            transmission_sig,
            webhook_id,
            webhook_event: payload.clone(),
        };

        let response = match self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err = self.map_request_error(e);
                tracing::warn!(error = %err, "Webhook verification request failed");
                return WebhookVerification::failed(format!("verification error: {}", err));
            }
        };

        let response = match self.check_status(response).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Webhook verification rejected by gateway");
                return WebhookVerification::failed(format!("verification error: {}", e));
            }
        };

        let outcome: VerifyWebhookResponse = match response.json().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Webhook verification response unreadable");
                return WebhookVerification::failed(format!("verification error: {}", e));
            }
        };

        if outcome.verification_status == "SUCCESS" {
            WebhookVerification::verified()
        } else {
            WebhookVerification::failed(format!(
                "gateway returned {}",
                outcome.verification_status
            ))
        }
    }
}

/// Extract the machine-readable error name from a PayPal error body.
fn error_name(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("name")?.as_str().map(|s| s.to_string())
}

/// Find the buyer approval link in a subscription response.
fn approve_link(links: &[LinkDescription]) -> Option<String> {
    links
        .iter()
        .find(|link| link.rel == "approve")
        .map(|link| link.href.clone())
}

/// Build the capture result, falling back field by field.
///
/// The capture id prefers `purchase_units[0].payments.captures[0].id`,
/// then the top-level order id, then the requested order id. The plan
/// comes from the purchase unit's correlation tag.
fn capture_from_response(order_id: &str, raw: serde_json::Value) -> OrderCaptured {
    let parsed: CaptureOrderResponse = serde_json::from_value(raw.clone()).unwrap_or_default();

    let unit = parsed.purchase_units.first();
    let capture = unit
        .and_then(|u| u.payments.as_ref())
        .and_then(|p| p.captures.first());

    let capture_id = capture
        .and_then(|c| c.id.clone())
        .or_else(|| parsed.id.clone())
        .unwrap_or_else(|| order_id.to_string());
    let plan_id = unit
        .and_then(|u| u.custom_id.clone())
        .unwrap_or_else(|| DEFAULT_CAPTURE_PLAN.to_string());
    let status = parsed
        .status
        .clone()
        .or_else(|| capture.and_then(|c| c.status.clone()))
        .unwrap_or_else(|| "COMPLETED".to_string());

    OrderCaptured {
        capture_id,
        order_id: order_id.to_string(),
        plan_id,
        status,
        raw,
    }
}

/// Build the subscription state from a fetched subscription payload.
fn subscription_state(requested_id: &str, raw: serde_json::Value) -> SubscriptionState {
    let parsed: SubscriptionResponse = serde_json::from_value(raw.clone()).unwrap_or_default();

    let next_billing_time = parsed
        .billing_info
        .as_ref()
        .and_then(|info| info.next_billing_time.as_deref())
        .and_then(|t| Timestamp::parse_rfc3339(t).ok());

    SubscriptionState {
        subscription_id: parsed
            .id
            .clone()
            .unwrap_or_else(|| requested_id.to_string()),
        plan_id: parsed.plan_id.clone(),
        status: parsed.status.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
        next_billing_time,
        raw,
    }
}
