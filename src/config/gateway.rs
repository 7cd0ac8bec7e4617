//! Settlement gateway configuration

use serde::Deserialize;

use super::error::ValidationError;

/// PayPal gateway configuration
///
/// When `simulate` is set, or when no API credentials are supplied, the
/// service runs against the simulated gateway instead of PayPal.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// PayPal REST API client id
    #[serde(default)]
    pub client_id: String,

    /// PayPal REST API client secret
    #[serde(default)]
    pub client_secret: String,

    /// Which PayPal environment to talk to
    #[serde(default)]
    pub mode: GatewayMode,

    /// Force the simulated gateway even when credentials are present
    #[serde(default)]
    pub simulate: bool,

    /// Webhook id used for signature verification
    pub webhook_id: Option<String>,

    /// Pre-provisioned catalog product id (skips product creation)
    pub product_id: Option<String>,

    /// Pre-provisioned billing plan id (skips plan creation)
    pub plan_id: Option<String>,

    /// Brand name shown on PayPal approval pages
    #[serde(default = "default_brand_name")]
    pub brand_name: String,

    /// URL the buyer returns to after approving a subscription
    #[serde(default = "default_return_url")]
    pub return_url: String,

    /// URL the buyer returns to after cancelling approval
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,

    /// Timeout for each gateway HTTP call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// PayPal API environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    #[default]
    Sandbox,
    Live,
}

impl GatewayConfig {
    /// Check if both API credentials are configured
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Check if the simulated gateway should be used
    pub fn simulation_enabled(&self) -> bool {
        self.simulate || !self.has_credentials()
    }

    /// Check if pointed at the live PayPal environment
    pub fn is_live(&self) -> bool {
        self.mode == GatewayMode::Live
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        for url in [&self.return_url, &self.cancel_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidRedirectUrl);
            }
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            mode: GatewayMode::default(),
            simulate: false,
            webhook_id: None,
            product_id: None,
            plan_id: None,
            brand_name: default_brand_name(),
            return_url: default_return_url(),
            cancel_url: default_cancel_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_brand_name() -> String {
    "Tollgate".to_string()
}

fn default_return_url() -> String {
    "http://localhost:3000/billing/return".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/billing/cancel".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
