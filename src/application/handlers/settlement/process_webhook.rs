//! ProcessWebhookHandler - Command handler for gateway webhook notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{EventDisposition, GatewayEvent};
use crate::ports::{EntitlementStore, SettlementGateway, StoreError, WebhookHeaders};

/// Command carrying one inbound webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub headers: WebhookHeaders,
    pub body: serde_json::Value,
}

/// Result of webhook processing.
///
/// The handler never fails: the gateway retries on non-2xx, so every
/// delivery is acknowledged and the outcome is reported here instead.
#[derive(Debug, Clone)]
pub struct ProcessWebhookResult {
    /// Whether the delivery passed signature verification.
    pub verified: bool,
    pub outcome: WebhookOutcome,
}

/// What happened to the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Applied to a user's record.
    Applied { user_id: UserId },
    /// Older than the record's watermark; dropped.
    Stale { user_id: UserId },
    /// No user matched the event. Logged and counted.
    Unmatched,
    /// Not a subscription event, or unparseable body.
    Ignored,
    /// A store operation failed mid-processing.
    Failed,
}

/// Running counters over processed webhooks.
#[derive(Debug, Default)]
pub struct WebhookStats {
    received: AtomicU64,
    applied: AtomicU64,
    stale: AtomicU64,
    unmatched: AtomicU64,
    verify_failed: AtomicU64,
}

/// Point-in-time view of the webhook counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookStatsSnapshot {
    pub received: u64,
    pub applied: u64,
    pub stale: u64,
    pub unmatched: u64,
    pub verify_failed: u64,
}

impl WebhookStats {
    fn snapshot(&self) -> WebhookStatsSnapshot {
        WebhookStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            verify_failed: self.verify_failed.load(Ordering::Relaxed),
        }
    }
}

/// Handler for inbound gateway webhooks.
///
/// Verifies authenticity, resolves the affected user from the payload
/// (subscription id first, buyer email as fallback) and applies the
/// event to their record. Verification failure is observable but does
/// not stop processing.
pub struct ProcessWebhookHandler {
    store: Arc<dyn EntitlementStore>,
    gateway: Arc<dyn SettlementGateway>,
    stats: WebhookStats,
}

impl ProcessWebhookHandler {
    pub fn new(store: Arc<dyn EntitlementStore>, gateway: Arc<dyn SettlementGateway>) -> Self {
        Self {
            store,
            gateway,
            stats: WebhookStats::default(),
        }
    }

    /// Current counter values.
    pub fn stats(&self) -> WebhookStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn handle(&self, cmd: ProcessWebhookCommand) -> ProcessWebhookResult {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        // 1. Verify authenticity; a failure is recorded but processing
        //    continues so legitimate state changes are not lost
        let verification = self.gateway.verify_webhook(&cmd.headers, &cmd.body).await;
        if !verification.verified {
            self.stats.verify_failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(detail = %verification.detail, "Webhook not verified");
        }

        let outcome = self.apply_event(&cmd.body).await;

        ProcessWebhookResult {
            verified: verification.verified,
            outcome,
        }
    }

    async fn apply_event(&self, body: &serde_json::Value) -> WebhookOutcome {
        // 2. Parse the envelope; unparseable bodies are acknowledged
        let event: GatewayEvent = serde_json::from_value(body.clone()).unwrap_or_default();
        if !event.is_subscription_event() {
            tracing::debug!(event_type = %event.event_type, "Ignoring non-subscription event");
            return WebhookOutcome::Ignored;
        }

        // 3. Resolve the affected user from the payload
        let user_id = match self.resolve_user(&event).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                self.stats.unmatched.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event_type = %event.event_type,
                    subscription_id = event.subscription_id().unwrap_or("-"),
                    "Webhook matched no user"
                );
                return WebhookOutcome::Unmatched;
            }
            Err(e) => {
                tracing::error!(error = %e, "Webhook user lookup failed");
                return WebhookOutcome::Failed;
            }
        };

        // 4. Apply the event to the record, guarded by the watermark
        let mut subscription = match self.store.get(&user_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                self.stats.unmatched.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(user_id = %user_id, "Matched user has no record");
                return WebhookOutcome::Unmatched;
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Webhook record load failed");
                return WebhookOutcome::Failed;
            }
        };

        let update = event.to_settlement_update(self.gateway.provider_name());
        let event_type = update.event_type.clone();

        if subscription.apply_settlement_event(update) == EventDisposition::Stale {
            self.stats.stale.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                user_id = %user_id,
                event_type = %event_type,
                "Dropped stale webhook event"
            );
            return WebhookOutcome::Stale { user_id };
        }

        // 5. Retain the raw payload and persist
        subscription.set_metadata("last_webhook", body.clone());
        if let Err(e) = self.store.set(&user_id, &subscription).await {
            tracing::error!(error = %e, user_id = %user_id, "Webhook record write failed");
            return WebhookOutcome::Failed;
        }

        self.stats.applied.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            user_id = %user_id,
            event_type = %event_type,
            status = ?subscription.status,
            "Webhook event applied"
        );
        WebhookOutcome::Applied { user_id }
    }

    async fn resolve_user(&self, event: &GatewayEvent) -> Result<Option<UserId>, StoreError> {
        if let Some(subscription_id) = event.subscription_id() {
            if let Some(user_id) = self
                .store
                .find_user_by_subscription_id(subscription_id)
                .await?
            {
                return Ok(Some(user_id));
            }
        }
        if let Some(email) = event.subscriber_email() {
            if let Some(user_id) = self.store.find_user_by_email(email).await? {
                return Ok(Some(user_id));
            }
        }
        Ok(None)
    }
}
