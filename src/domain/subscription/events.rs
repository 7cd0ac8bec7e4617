//! Gateway webhook event types.
//!
//! Defines the structures for parsing PayPal webhook payloads.
//! Only fields relevant to our processing are captured.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{SettlementUpdate, SubscriptionStatus};

/// PayPal webhook event envelope (simplified).
///
/// Contains the essential fields needed for webhook processing.
/// Additional fields from PayPal's full event schema are ignored, and
/// every field is optional so that malformed payloads still parse and
/// can be acknowledged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayEvent {
    /// Unique identifier for the event (WH-xxx format).
    pub id: Option<String>,

    /// Type of event (e.g., "BILLING.SUBSCRIPTION.ACTIVATED").
    pub event_type: String,

    /// Time at which the event was created (RFC 3339).
    pub create_time: Option<String>,

    /// The subscription the event refers to.
    pub resource: Option<EventResource>,
}

/// Subscription snapshot carried inside an event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EventResource {
    /// Gateway subscription id (I-xxx format).
    pub id: Option<String>,

    /// Gateway-reported status (e.g., "ACTIVE", "SUSPENDED").
    pub status: Option<String>,

    /// Billing plan the subscription runs on.
    pub plan_id: Option<String>,

    pub billing_info: Option<BillingInfo>,

    pub subscriber: Option<Subscriber>,
}

/// Billing schedule fragment of the resource.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BillingInfo {
    /// When the next charge is due (RFC 3339).
    pub next_billing_time: Option<String>,
}

/// Buyer fragment of the resource, used to match events to users.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Subscriber {
    pub email_address: Option<String>,
}

impl GatewayEvent {
    /// Returns true if this event describes a billing subscription.
    ///
    /// Everything else (payments, disputes, unrelated products) is
    /// acknowledged without processing.
    pub fn is_subscription_event(&self) -> bool {
        self.event_type.starts_with("BILLING.SUBSCRIPTION")
    }

    /// When the event happened, if the envelope carried a parseable
    /// timestamp.
    pub fn occurred_at(&self) -> Option<Timestamp> {
        self.create_time
            .as_deref()
            .and_then(|t| Timestamp::parse_rfc3339(t).ok())
    }

    /// Gateway subscription id the event refers to.
    pub fn subscription_id(&self) -> Option<&str> {
        self.resource.as_ref()?.id.as_deref()
    }

    /// Buyer email, used as a fallback to locate the user.
    pub fn subscriber_email(&self) -> Option<&str> {
        self.resource.as_ref()?.subscriber.as_ref()?.email_address.as_deref()
    }

    /// Normalizes this event into a [`SettlementUpdate`] for the
    /// subscription record.
    pub fn to_settlement_update(&self, provider: &str) -> SettlementUpdate {
        let resource = self.resource.as_ref();
        SettlementUpdate {
            provider: provider.to_string(),
            event_type: self.event_type.clone(),
            subscription_id: resource.and_then(|r| r.id.clone()),
            plan_id: resource.and_then(|r| r.plan_id.clone()),
            status: resource
                .and_then(|r| r.status.as_deref())
                .and_then(SubscriptionStatus::from_gateway),
            period_end: resource
                .and_then(|r| r.billing_info.as_ref())
                .and_then(|b| b.next_billing_time.as_deref())
                .and_then(|t| Timestamp::parse_rfc3339(t).ok()),
            occurred_at: self.occurred_at(),
        }
    }
}
