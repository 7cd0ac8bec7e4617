//! PayPal-specific request and response types.
//!
//! These types mirror the PayPal REST API shapes the gateway adapter
//! exchanges: OAuth2 tokens, checkout orders, catalog products, billing
//! plans, subscriptions, and webhook signature verification. Response
//! types default every field so partial payloads degrade to fallbacks
//! instead of parse failures.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Shared
// ════════════════════════════════════════════════════════════════════════════════

/// Monetary amount as PayPal represents it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Money {
    /// ISO 4217 currency code.
    pub currency_code: String,

    /// Decimal string value (e.g., "9.99").
    pub value: String,
}

/// HATEOAS link attached to PayPal responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkDescription {
    /// Target URL.
    pub href: String,

    /// Link relation (e.g., "approve", "self").
    pub rel: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// OAuth2 Token
// ════════════════════════════════════════════════════════════════════════════════

/// Response from the client-credentials token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent API calls.
    pub access_token: String,

    /// Token lifetime in seconds.
    pub expires_in: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Orders
// ════════════════════════════════════════════════════════════════════════════════

/// Body for `POST /v2/checkout/orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderBody {
    /// Always "CAPTURE" for one-time purchases.
    pub intent: String,

    pub purchase_units: Vec<PurchaseUnitRequest>,
}

/// Purchase unit in an order creation request.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseUnitRequest {
    pub amount: Money,

    /// Correlation tag; carries the plan id through capture.
    pub custom_id: String,
}

/// Response from order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    /// Gateway order id.
    pub id: String,

    /// Order status (e.g., "CREATED").
    pub status: String,
}

/// Response from `POST /v2/checkout/orders/{id}/capture`.
///
/// Every field defaults: the capture extraction falls back to the
/// order id and a stock plan label when pieces are missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureOrderResponse {
    /// Top-level order id.
    pub id: Option<String>,

    /// Top-level capture status (e.g., "COMPLETED").
    pub status: Option<String>,

    pub purchase_units: Vec<CapturedPurchaseUnit>,
}

/// Purchase unit in a capture response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CapturedPurchaseUnit {
    /// Correlation tag set at order creation.
    pub custom_id: Option<String>,

    pub payments: Option<CapturedPayments>,
}

/// Payments block nested in a captured purchase unit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CapturedPayments {
    pub captures: Vec<CaptureDetail>,
}

/// A single capture inside the payments block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureDetail {
    /// Capture id recorded as the subscription id after activation.
    pub id: Option<String>,

    pub status: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Catalog Products & Billing Plans
// ════════════════════════════════════════════════════════════════════════════════

/// Body for `POST /v1/catalogs/products`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateProductBody {
    pub name: String,

    pub description: String,

    /// Always "SERVICE" for subscription products.
    #[serde(rename = "type")]
    pub product_type: String,

    /// Always "SOFTWARE".
    pub category: String,
}

/// Response from product creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductResponse {
    pub id: String,
}

/// Body for `POST /v1/billing/plans`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlanBody {
    pub product_id: String,

    /// Display name (e.g., "Monthly 9.99 USD").
    pub name: String,

    pub billing_cycles: Vec<BillingCycleRequest>,

    pub payment_preferences: PaymentPreferencesRequest,
}

/// Single billing cycle definition.
#[derive(Debug, Clone, Serialize)]
pub struct BillingCycleRequest {
    pub frequency: FrequencyRequest,

    /// "REGULAR" (as opposed to trial cycles).
    pub tenure_type: String,

    pub sequence: u32,

    /// 0 means the cycle repeats until cancelled.
    pub total_cycles: u32,

    pub pricing_scheme: PricingSchemeRequest,
}

/// Billing frequency.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyRequest {
    /// Interval unit (e.g., "MONTH").
    pub interval_unit: String,

    pub interval_count: u32,
}

/// Fixed-price pricing scheme.
#[derive(Debug, Clone, Serialize)]
pub struct PricingSchemeRequest {
    pub fixed_price: Money,
}

/// Payment preferences for a billing plan.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentPreferencesRequest {
    pub auto_bill_outstanding: bool,

    pub setup_fee: Money,

    /// "CONTINUE" keeps the subscription alive if the setup fee fails.
    pub setup_fee_failure_action: String,

    /// Failed payments tolerated before suspension.
    pub payment_failure_threshold: u32,
}

/// Response from plan creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanResponse {
    pub id: String,

    /// "CREATED" plans get a best-effort activation call.
    pub status: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// Body for `POST /v1/billing/subscriptions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscriptionBody {
    pub plan_id: String,

    pub application_context: ApplicationContext,
}

/// Approval-flow presentation settings.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationContext {
    pub brand_name: String,

    pub locale: String,

    /// Where the buyer lands after approving.
    pub return_url: String,

    /// Where the buyer lands after abandoning approval.
    pub cancel_url: String,
}

/// Subscription object returned by create and fetch calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionResponse {
    pub id: Option<String>,

    /// Gateway status ("ACTIVE", "APPROVAL_PENDING", ...).
    pub status: Option<String>,

    pub plan_id: Option<String>,

    pub billing_info: Option<BillingInfoResponse>,

    pub links: Vec<LinkDescription>,
}

/// Billing details nested in a subscription response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BillingInfoResponse {
    /// RFC 3339 timestamp of the next charge.
    pub next_billing_time: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Verification
// ════════════════════════════════════════════════════════════════════════════════

/// Body for `POST /v1/notifications/verify-webhook-signature`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyWebhookBody {
    pub transmission_id: String,

    pub transmission_time: String,

    pub cert_url: String,

    pub auth_algo: String,

    pub transmission_sig: String,

    /// The webhook id assigned by PayPal when the endpoint was registered.
    pub webhook_id: String,

    /// The raw event body exactly as delivered.
    pub webhook_event: serde_json::Value,
}

/// Response from webhook verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyWebhookResponse {
    /// "SUCCESS" or "FAILURE".
    pub verification_status: String,
}
