//! Failure types shared across the domain layer.
//!
//! `ValidationError` covers value-object construction. `DomainError`
//! pairs a stable wire code with a human-readable message and is what
//! the subscription rules raise when an operation is illegal.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// A value object rejected its input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' must not be blank")]
    EmptyField { field: String },

    #[error("Field '{field}' is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable machine-readable codes carried on the error envelope.
///
/// The string forms are part of the HTTP contract; renaming one is a
/// breaking change for API consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Input rejection
    ValidationFailed,
    EmptyField,
    InvalidFormat,

    // Lookup
    UserNotFound,

    // Subscription lifecycle
    InvalidStateTransition,
    SubscriptionNotActivatable,

    // Settlement gateway
    GatewayError,
    GatewayTimeout,

    // Persistence and catch-all
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::SubscriptionNotActivatable => "SUBSCRIPTION_NOT_ACTIVATABLE",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::GatewayTimeout => "GATEWAY_TIMEOUT",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(code)
    }
}

/// A coded domain failure with optional key/value context.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Attach a context entry, builder style.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// A `ValidationFailed` error annotated with the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
