//! Error type for the settlement application layer.
//!
//! Everything the settlement operations can fail with funnels into
//! [`SettlementError`]; the HTTP layer turns the variant into a status
//! code and the [`ErrorCode`] into the wire envelope.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `UserNotFound` | 404 |
//! | `InvalidState` | 409 |
//! | `NotActivatable` | 400 |
//! | `ValidationFailed` | 400 |
//! | `GatewayRejected` | 502 |
//! | `GatewayTimeout` | 504 |
//! | `Infrastructure` | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

/// Failures surfaced by settlement operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// No entitlement record for the caller.
    UserNotFound(UserId),

    /// The subscription cannot take the attempted action from its
    /// current status.
    InvalidState { current: String, attempted: String },

    /// The gateway-side subscription is in a status that cannot be
    /// activated locally.
    NotActivatable { status: String },

    /// A request field failed validation.
    ValidationFailed { field: String, message: String },

    /// The gateway answered with an error.
    GatewayRejected { reason: String },

    /// The gateway did not answer before the configured deadline.
    GatewayTimeout,

    /// Store failures and anything else operational.
    Infrastructure(String),
}

impl SettlementError {
    pub fn user_not_found(user_id: UserId) -> Self {
        Self::UserNotFound(user_id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn not_activatable(status: impl Into<String>) -> Self {
        Self::NotActivatable {
            status: status.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_rejected(reason: impl Into<String>) -> Self {
        Self::GatewayRejected {
            reason: reason.into(),
        }
    }

    pub fn gateway_timeout() -> Self {
        Self::GatewayTimeout
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }

    /// Stable machine code carried in the wire envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            Self::NotActivatable { .. } => ErrorCode::SubscriptionNotActivatable,
            Self::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            Self::GatewayRejected { .. } => ErrorCode::GatewayError,
            Self::GatewayTimeout => ErrorCode::GatewayTimeout,
            Self::Infrastructure(_) => ErrorCode::StorageError,
        }
    }

    /// Human-oriented description, also used as the HTTP error message.
    pub fn message(&self) -> String {
        match self {
            Self::UserNotFound(user_id) => {
                format!("No subscription record for user: {}", user_id)
            }
            Self::InvalidState { current, attempted } => {
                format!("Cannot {} subscription in {} state", attempted, current)
            }
            Self::NotActivatable { status } => {
                format!("Subscription is not active at the gateway: {}", status)
            }
            Self::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            Self::GatewayRejected { reason } => {
                format!("Payment gateway error: {}", reason)
            }
            Self::GatewayTimeout => "Payment gateway timed out".to_string(),
            Self::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Whether a client could plausibly succeed by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Infrastructure(_) | Self::GatewayRejected { .. } | Self::GatewayTimeout
        )
    }
}

impl std::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SettlementError {}

impl From<DomainError> for SettlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => Self::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                Self::ValidationFailed {
                    field: "unknown".to_string(),
                    message: err.to_string(),
                }
            }
            _ => Self::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for SettlementError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => Self::ValidationFailed {
                field,
                message: "cannot be empty".to_string(),
            },
            ValidationError::InvalidFormat { field, reason } => Self::ValidationFailed {
                field,
                message: reason,
            },
        }
    }
}

impl From<SettlementError> for DomainError {
    fn from(err: SettlementError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> UserId {
        UserId::new("user-42").unwrap()
    }

    #[test]
    fn every_variant_reports_its_code() {
        let cases: Vec<(SettlementError, ErrorCode)> = vec![
            (
                SettlementError::user_not_found(uid()),
                ErrorCode::UserNotFound,
            ),
            (
                SettlementError::invalid_state("PastDue", "activate"),
                ErrorCode::InvalidStateTransition,
            ),
            (
                SettlementError::not_activatable("CANCELLED"),
                ErrorCode::SubscriptionNotActivatable,
            ),
            (
                SettlementError::validation("order_id", "must not be blank"),
                ErrorCode::ValidationFailed,
            ),
            (
                SettlementError::gateway_rejected("401 from token endpoint"),
                ErrorCode::GatewayError,
            ),
            (
                SettlementError::gateway_timeout(),
                ErrorCode::GatewayTimeout,
            ),
            (
                SettlementError::infrastructure("store write failed"),
                ErrorCode::StorageError,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn constructors_capture_their_arguments() {
        let err = SettlementError::invalid_state("PastDue", "activate");
        assert!(matches!(
            err,
            SettlementError::InvalidState { ref current, ref attempted }
                if current == "PastDue" && attempted == "activate"
        ));

        let err = SettlementError::not_activatable("APPROVAL_PENDING");
        assert!(matches!(
            err,
            SettlementError::NotActivatable { ref status } if status == "APPROVAL_PENDING"
        ));
    }

    #[test]
    fn messages_name_the_offending_input() {
        let id = uid();
        assert!(SettlementError::user_not_found(id.clone())
            .message()
            .contains(id.as_str()));
        assert!(SettlementError::not_activatable("SUSPENDED")
            .message()
            .contains("SUSPENDED"));
    }

    #[test]
    fn display_and_message_agree() {
        let err = SettlementError::gateway_timeout();
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(SettlementError::gateway_rejected("502").is_retryable());
        assert!(SettlementError::gateway_timeout().is_retryable());
        assert!(SettlementError::infrastructure("io").is_retryable());

        assert!(!SettlementError::validation("field", "bad").is_retryable());
        assert!(!SettlementError::user_not_found(uid()).is_retryable());
        assert!(!SettlementError::invalid_state("Cancelled", "cancel").is_retryable());
    }

    #[test]
    fn round_trips_code_through_domain_error() {
        let err = SettlementError::user_not_found(uid());
        let domain: DomainError = err.clone().into();
        assert_eq!(domain.code, err.code());
    }

    #[test]
    fn domain_transition_errors_become_invalid_state() {
        let domain = DomainError::new(ErrorCode::InvalidStateTransition, "bad transition");
        let err: SettlementError = domain.into();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn field_validation_keeps_the_field_name() {
        let err: SettlementError = ValidationError::empty_field("user_id").into();
        assert!(matches!(
            err,
            SettlementError::ValidationFailed { ref field, .. } if field == "user_id"
        ));
    }
}
