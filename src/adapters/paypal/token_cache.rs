//! Access token cache for the PayPal gateway.
//!
//! OAuth2 client-credentials tokens live for hours; fetching one per
//! outbound call would double every gateway round trip. The cache
//! holds the most recent token keyed by gateway environment and
//! invalidates it ahead of the reported expiry.

use tokio::sync::Mutex;

use crate::domain::foundation::Timestamp;

use super::paypal_gateway::PayPalEnvironment;

/// Tokens are refreshed this many seconds before they expire.
const REFRESH_MARGIN_SECS: u64 = 60;

/// In-memory cache for one access token per gateway instance.
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    environment: PayPalEnvironment,
    expires_at: Timestamp,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Return the cached token if it matches the environment and has
    /// not reached its refresh window.
    pub async fn get(&self, environment: PayPalEnvironment, now: Timestamp) -> Option<String> {
        let cached = self.inner.lock().await;
        match cached.as_ref() {
            Some(entry) if entry.environment == environment && entry.expires_at.is_after(&now) => {
                Some(entry.token.clone())
            }
            _ => None,
        }
    }

    /// Store a freshly issued token with its reported lifetime.
    pub async fn put(
        &self,
        environment: PayPalEnvironment,
        token: String,
        expires_in_secs: u64,
        now: Timestamp,
    ) {
        let expires_at = now.plus_secs(expires_in_secs.saturating_sub(REFRESH_MARGIN_SECS));
        let mut cached = self.inner.lock().await;
        *cached = Some(CachedToken {
            token,
            environment,
            expires_at,
        });
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
