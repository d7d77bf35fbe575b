//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure becomes a `{"message": ...}` body with the matching status.
//! Internal error details are logged and never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mart_core::{StaffRejection, ValidationError};
use mart_crypto::CryptoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description of the failure.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid, or expired credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (403).
    #[error("{0}")]
    Forbidden(String),

    /// Resource absent or identifier malformed (404).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure (500). Logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), message = %other, "request rejected");
                other.to_string()
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Malformed identifiers read as "not found"; other field errors are 400s.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        if err.is_identifier() {
            Self::NotFound(err.to_string())
        } else {
            Self::BadRequest(err.to_string())
        }
    }
}

impl From<StaffRejection> for AppError {
    fn from(err: StaffRejection) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Token problems are the caller's; hashing and signing problems are ours.
impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Expired | CryptoError::InvalidToken(_) => {
                Self::Unauthorized(err.to_string())
            }
            CryptoError::Hashing(_) | CryptoError::MalformedHash(_) | CryptoError::Signing(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {err}"))
    }
}
