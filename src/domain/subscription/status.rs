//! Subscription status state machine.
//!
//! Defines all possible subscription states and valid transitions
//! according to the billing lifecycle.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription billing status.
///
/// Represents the current state of a user's subscription as reported
/// by the settlement gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription, or a subscription that never activated.
    /// This is the state every record starts in.
    #[default]
    Inactive,

    /// Paid subscription. Entitlement additionally requires an
    /// unexpired period end.
    Active,

    /// Subscription was cancelled or expired at the gateway.
    Cancelled,

    /// Gateway suspended the subscription after failed payment.
    PastDue,
}

impl SubscriptionStatus {
    /// Returns true if this status can grant entitlement.
    ///
    /// Only `Active` qualifies. The full entitlement check also
    /// requires a period end in the future; see
    /// [`Subscription::has_access`](super::Subscription::has_access).
    pub fn has_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Maps a gateway-reported subscription status onto the local
    /// lifecycle.
    ///
    /// Returns `None` for statuses with no local equivalent, in which
    /// case the stored status is left unchanged.
    pub fn from_gateway(status: &str) -> Option<Self> {
        match status {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "SUSPENDED" => Some(SubscriptionStatus::PastDue),
            "CANCELLED" | "EXPIRED" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From INACTIVE
            (Inactive, Active)
                | (Inactive, Cancelled)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, Cancelled)
                | (Active, PastDue)
            // From CANCELLED
                | (Cancelled, Active) // Resubscribe
                | (Cancelled, Cancelled)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Inactive => vec![Active, Cancelled],
            Active => vec![Active, Cancelled, PastDue],
            Cancelled => vec![Active, Cancelled],
            PastDue => vec![Active, Cancelled],
        }
    }
}
