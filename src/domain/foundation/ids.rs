//! Identifier value objects.
//!
//! User accounts are minted by the platform's auth system; this crate
//! receives their ids as opaque strings and only enforces that an id
//! is present at all.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Opaque identifier of a platform user.
///
/// Wraps whatever the upstream auth layer issued. Blank values are
/// rejected so a missing header cannot masquerade as a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        match id.trim() {
            "" => Err(ValidationError::empty_field("user_id")),
            _ => Ok(Self(id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
