//! Subscription aggregate entity.
//!
//! The Subscription record represents a user's billing relationship with
//! the settlement gateway. Each user has exactly one record; users who
//! never purchased anything hold the default inactive record.
//!
//! # Design Decisions
//!
//! - **One per user**: The record lives on the user document, replaced
//!   wholesale on every write
//! - **Fail-secure**: Missing or expired period end means no entitlement,
//!   regardless of status
//! - **Monotonic events**: Gateway events older than `last_event_at` are
//!   dropped, so out-of-order webhook delivery cannot rewind state

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::SubscriptionStatus;

/// Subscription record - a user's billing state.
///
/// # Invariants
///
/// - Caller-driven status changes follow the state machine rules
/// - An `Active` record always carries `provider`, `plan_id` and
///   `subscription_id`, set atomically by [`Subscription::activate`]
/// - `last_event_at` only ever moves forward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Subscription {
    /// Gateway that owns this subscription ("paypal" or "simulated").
    pub provider: Option<String>,

    /// Billing plan identifier at the gateway.
    pub plan_id: Option<String>,

    /// Subscription identifier at the gateway.
    pub subscription_id: Option<String>,

    /// Current status in the billing lifecycle.
    pub status: SubscriptionStatus,

    /// End of the currently paid-for period.
    pub current_period_end: Option<Timestamp>,

    /// Free-form gateway bookkeeping: raw webhook, capture and
    /// subscription payloads, keyed by source. Never consulted for
    /// entitlement decisions.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Watermark of the newest gateway event applied to this record.
    pub last_event_at: Option<Timestamp>,

    /// When the record was last written.
    pub updated_at: Timestamp,
}

/// Fields required to activate a subscription.
///
/// Grouping them in one struct guarantees the record never becomes
/// Active with a partial gateway identity.
#[derive(Debug, Clone)]
pub struct Activation {
    pub provider: String,
    pub plan_id: String,
    pub subscription_id: String,
    pub period_end: Timestamp,
}

/// Normalized change extracted from a gateway event.
///
/// `None` fields mean the event did not carry that value and the stored
/// value is kept.
#[derive(Debug, Clone)]
pub struct SettlementUpdate {
    pub provider: String,
    pub event_type: String,
    pub subscription_id: Option<String>,
    pub plan_id: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub period_end: Option<Timestamp>,
    pub occurred_at: Option<Timestamp>,
}

/// What happened when a gateway event was applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The event was newer than the watermark and was applied.
    Applied,
    /// The event was not newer than the watermark and was dropped.
    Stale,
}

impl Subscription {
    /// Create the default inactive record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this subscription currently grants entitlement.
    ///
    /// Requires an Active status AND a period end strictly in the
    /// future. A missing period end denies access.
    pub fn has_access(&self, now: Timestamp) -> bool {
        if !self.status.has_access() {
            return false;
        }
        match self.current_period_end {
            Some(end) => end.is_after(&now),
            None => false,
        }
    }

    /// Activate this subscription after the gateway confirmed it.
    ///
    /// Sets the gateway identity and period end in the same write, so
    /// an Active record can never lack its subscription id.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn activate(&mut self, activation: Activation) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        self.provider = Some(activation.provider);
        self.plan_id = Some(activation.plan_id);
        self.subscription_id = Some(activation.subscription_id);
        self.current_period_end = Some(activation.period_end);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Cancel this subscription.
    ///
    /// Cancelling is idempotent and allowed even before anything was
    /// purchased. Gateway identifiers are kept for bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Apply a normalized gateway event to this record.
    ///
    /// Events carrying a `occurred_at` not newer than `last_event_at`
    /// are dropped. The gateway is the source of truth here, so status
    /// is written directly rather than through the state machine.
    pub fn apply_settlement_event(&mut self, update: SettlementUpdate) -> EventDisposition {
        if let (Some(occurred), Some(watermark)) = (update.occurred_at, self.last_event_at) {
            if !occurred.is_after(&watermark) {
                return EventDisposition::Stale;
            }
        }

        self.provider = Some(update.provider);
        if let Some(subscription_id) = update.subscription_id {
            self.subscription_id = Some(subscription_id);
        }
        if let Some(plan_id) = update.plan_id {
            self.plan_id = Some(plan_id);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(period_end) = update.period_end {
            self.current_period_end = Some(period_end);
        }
        // Events without a timestamp are applied but cannot advance the
        // watermark.
        if let Some(occurred) = update.occurred_at {
            self.last_event_at = Some(occurred);
        }
        self.updated_at = Timestamp::now();

        EventDisposition::Applied
    }

    /// Record a raw gateway payload under a metadata key.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.updated_at = Timestamp::now();
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        use crate::domain::foundation::StateMachine;

        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
