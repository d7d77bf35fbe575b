//! Store lookup and authorization for handlers.
//!
//! Lookups and decisions keep their precise failure reason. Store routes
//! report a failed lookup as 404; product routes collapse every failure
//! to 403 through [`AccessError::forbidden`], which logs the real reason.

use mart_core::authz::authorize;
use mart_core::{AccessScope, Decision, DenyReason, StoreId, StoreRecord, UserId};
use thiserror::Error;

use crate::error::AppError;
use crate::state::AppState;

/// Why a store could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The identifier is not a valid store id.
    #[error("malformed store id: {0}")]
    MalformedId(String),
    /// No store has this id.
    #[error("store {0} not found")]
    StoreMissing(StoreId),
}

/// Why an operation on a store was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The store could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// The store exists but the caller may not act on it.
    #[error("access denied: {}", .0.as_str())]
    Denied(DenyReason),
}

impl AccessError {
    /// Collapse to a 403, logging the underlying reason.
    pub fn forbidden(self, operation: &'static str, caller: Option<&UserId>) -> AppError {
        tracing::warn!(
            operation,
            caller = ?caller,
            reason = %self,
            "store access refused"
        );
        metrics::counter!("mart_access_denied_total", "operation" => operation).increment(1);
        AppError::Forbidden("not authorized for this store".into())
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        Self::NotFound(err.to_string())
    }
}

/// Resolve a raw store id.
pub fn resolve_store(state: &AppState, raw: &str) -> Result<StoreRecord, LookupError> {
    let id: StoreId = raw
        .trim()
        .parse()
        .map_err(|_| LookupError::MalformedId(raw.to_string()))?;
    state.stores.get(&id).ok_or(LookupError::StoreMissing(id))
}

/// Check `caller` against an already resolved store.
pub fn check_store(
    store: &StoreRecord,
    caller: Option<&UserId>,
    scope: AccessScope,
) -> Result<(), AccessError> {
    match authorize(Some(store), caller, scope) {
        Decision::Allowed => Ok(()),
        Decision::Denied(reason) => Err(AccessError::Denied(reason)),
    }
}

/// Resolve a raw store id and authorize `caller` on it.
pub fn authorize_store(
    state: &AppState,
    raw: &str,
    caller: Option<&UserId>,
    scope: AccessScope,
) -> Result<StoreRecord, AccessError> {
    let store = resolve_store(state, raw)?;
    check_store(&store, caller, scope)?;
    Ok(store)
}

/// Authorize `caller` on the store that owns an existing resource.
pub fn authorize_owner(
    state: &AppState,
    store_id: StoreId,
    caller: Option<&UserId>,
    scope: AccessScope,
) -> Result<StoreRecord, AccessError> {
    let store = state
        .stores
        .get(&store_id)
        .ok_or(LookupError::StoreMissing(store_id))?;
    check_store(&store, caller, scope)?;
    Ok(store)
}
