//! # Error Types
//!
//! Validation failures for domain primitives and request fields. Every
//! variant is a client error; the API layer maps them to 400 or, for
//! identifiers, to 404.

use thiserror::Error;

/// A domain value failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier text is not a UUID.
    #[error("invalid {kind} id: \"{value}\"")]
    InvalidId {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Email address is empty or has no `@`.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// Role name is not one of user, manager, staff.
    #[error("unknown role: \"{0}\"")]
    InvalidRole(String),

    /// Price is present but not an integer amount of minor units.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A mandatory field is absent or blank.
    #[error("{0}")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Whether this error concerns an identifier rather than a body field.
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }
}
