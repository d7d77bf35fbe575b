//! # Request Extraction Helpers
//!
//! JSON bodies and path identifiers are extracted leniently and mapped to
//! [`AppError`] by hand, so clients always get the `{"message"}` envelope
//! instead of Axum's plain-text rejections.

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use mart_core::ValidationError;

use crate::error::AppError;

/// Request types that check their own business rules after deserialization.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}

/// Extract a query string, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract the raw `{id}` path segment. A segment that cannot be decoded
/// is a malformed id and reads as "not found".
pub fn extract_path(result: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::NotFound(format!("malformed identifier: {}", err.body_text())))
}

/// Parse a path identifier. Malformed ids become 404s.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse::<T>().map_err(AppError::from)
}

/// Whether an optional text field is absent or whitespace only.
pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use mart_core::StoreId;

    #[test]
    fn parse_id_accepts_uuid() {
        let id = StoreId::new();
        assert_eq!(parse_id::<StoreId>(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_id_rejects_with_not_found() {
        let err = parse_id::<StoreId>("123").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some("   ".into())));
        assert!(!is_blank(&Some("Loja".into())));
    }
}
