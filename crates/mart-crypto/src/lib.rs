//! # mart-crypto — Credential Primitives
//!
//! - **Passwords**: Argon2id hashing into PHC strings with a random salt
//!   per hash ([`PasswordHasher`]).
//! - **Identity tokens**: HS256 JWTs carrying the user's id, email, name,
//!   and role ([`TokenIssuer`], [`Claims`]).
//!
//! ## Crate Policy
//!
//! - Depends only on `mart-core` internally.
//! - Tests use real Argon2 and real signatures; nothing is mocked.

pub mod error;
pub mod password;
pub mod token;

pub use error::CryptoError;
pub use password::PasswordHasher;
pub use token::{Claims, TokenIssuer};
