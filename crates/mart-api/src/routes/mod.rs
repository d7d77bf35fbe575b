//! # API Route Modules
//!
//! - `users`: registration, login, and the non-production user listing.
//! - `stores`: store listing, creation, staff assignment, and deletion.
//! - `products`: store-scoped product CRUD with filtered listing.
//!
//! All three are nested under `/api` by [`crate::app`].

pub mod products;
pub mod stores;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// `{"message": ...}` body returned by delete operations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination and search query for list endpoints.
///
/// Values are kept as raw strings so malformed numbers are clamped
/// rather than rejected.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Items to skip. Defaults to 0.
    pub offset: Option<String>,
    /// Page size, at most 100. Defaults to 10.
    pub limit: Option<String>,
    /// Case-insensitive name pattern (products only).
    pub term: Option<String>,
}
