//! Error type for credential operations.

use thiserror::Error;

/// Failure while hashing, verifying, issuing, or decoding credentials.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Argon2 could not produce a hash.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Stored hash is not a valid PHC string.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Token signature or structure is invalid.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is well-formed but past its expiry.
    #[error("token has expired")]
    Expired,
}
