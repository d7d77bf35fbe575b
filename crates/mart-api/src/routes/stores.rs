//! # Stores API
//!
//! Stores are created by any authenticated user, who becomes the
//! store's manager. Only the manager may add staff or delete the store.
//! Reads are public; members get the extended view.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mart_core::authz::{check_staff_candidate, detail_for, role_from_membership};
use mart_core::{project, AccessScope, Detail, Email, Page, Role, StoreRecord, StoreView};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::access::{check_store, resolve_store};
use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, is_blank, Validate};
use crate::routes::{ListQuery, MessageResponse};
use crate::state::AppState;

/// Store creation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    /// Store name.
    pub name: Option<String>,
}

impl Validate for CreateStoreRequest {
    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.name) {
            return Err("name is required".to_string());
        }
        Ok(())
    }
}

/// Staff assignment request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddStaffRequest {
    /// Email of the user to add.
    pub user_email: Option<String>,
}

impl Validate for AddStaffRequest {
    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.user_email) {
            return Err("user_email is required".to_string());
        }
        Ok(())
    }
}

/// One page of stores.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreList {
    /// Items skipped.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
    /// Items on this page.
    pub count: usize,
    /// Items across all pages.
    pub total_count: usize,
    /// Projected stores.
    #[schema(value_type = Vec<Object>)]
    pub stores: Vec<StoreView>,
}

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stores", get(list_stores).post(create_store))
        .route("/stores/{id}", get(get_store).delete(delete_store))
        .route("/stores/{id}/add-staff", post(add_staff))
}

/// GET /api/stores — List stores.
#[utoipa::path(
    get,
    path = "/api/stores",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of stores", body = StoreList),
    ),
    tag = "stores"
)]
pub(crate) async fn list_stores(
    State(state): State<AppState>,
    caller: Option<Caller>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<StoreList>, AppError> {
    let query = extract_query(query)?;
    let page = Page::from_query(query.offset.as_deref(), query.limit.as_deref());
    let principal = caller.as_ref().map(|c| c.id);

    let mut stores = state.stores.list();
    stores.sort_by_key(|s| s.created_at);
    let total_count = stores.len();

    let stores: Vec<StoreView> = page
        .slice(stores)
        .iter()
        .map(|s| project(s, &state, detail_for(Some(s), principal.as_ref())))
        .collect();

    Ok(Json(StoreList {
        offset: page.offset,
        limit: page.limit,
        count: stores.len(),
        total_count,
        stores,
    }))
}

/// GET /api/stores/{id} — Read one store.
#[utoipa::path(
    get,
    path = "/api/stores/{id}",
    params(("id" = String, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store, extended for its members"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "stores"
)]
pub(crate) async fn get_store(
    State(state): State<AppState>,
    caller: Option<Caller>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<StoreView>, AppError> {
    let store = resolve_store(&state, &extract_path(id)?)?;
    let detail = detail_for(Some(&store), caller.as_ref().map(|c| &c.id));
    Ok(Json(project(&store, &state, detail)))
}

/// POST /api/stores — Create a store managed by the caller.
#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created, extended view"),
        (status = 400, description = "Name missing", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub(crate) async fn create_store(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateStoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoreView>), AppError> {
    let req = extract_validated_json(body)?;
    let name = req.name.unwrap_or_default().trim().to_string();

    let _guard = state.mutation_lock.lock().await;
    let store = StoreRecord::new(name, caller.id);
    if let Some(pool) = &state.db_pool {
        crate::db::stores::create(pool, &store).await?;
    }
    state.stores.insert(store.id, store.clone());
    state.users.update(&caller.id, |u| u.role = Role::Manager);

    tracing::info!(store_id = %store.id, manager = %caller.id, "store created");
    metrics::counter!("mart_stores_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(project(&store, &state, Detail::Extended))))
}

/// POST /api/stores/{id}/add-staff — Add a user to the store's staff.
#[utoipa::path(
    post,
    path = "/api/stores/{id}/add-staff",
    params(("id" = String, Path, description = "Store ID")),
    request_body = AddStaffRequest,
    responses(
        (status = 200, description = "Staff added, extended view"),
        (status = 400, description = "Missing email or candidate not eligible", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not the manager", body = crate::error::ErrorBody),
        (status = 404, description = "Store or user not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub(crate) async fn add_staff(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<AddStaffRequest>, JsonRejection>,
) -> Result<Json<StoreView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;

    let _guard = state.mutation_lock.lock().await;
    let store = resolve_store(&state, &id)?;
    check_store(&store, Some(&caller.id), AccessScope::ManagerOnly)
        .map_err(|e| e.forbidden("add_staff", Some(&caller.id)))?;

    let candidate = Email::parse(req.user_email.as_deref().unwrap_or_default())
        .ok()
        .and_then(|email| state.user_by_email(&email))
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    check_staff_candidate(&store, &candidate.id, candidate.role)?;

    if let Some(pool) = &state.db_pool {
        crate::db::stores::add_staff(pool, store.id, candidate.id).await?;
    }
    state.users.update(&candidate.id, |u| u.role = Role::Staff);
    let store = state
        .stores
        .update(&store.id, |s| s.staff.push(candidate.id))
        .ok_or_else(|| AppError::Internal(format!("store {} vanished during update", store.id)))?;

    tracing::info!(store_id = %store.id, staff = %candidate.id, "staff added");
    Ok(Json(project(&store, &state, Detail::Extended)))
}

/// DELETE /api/stores/{id} — Delete a store and its products.
#[utoipa::path(
    delete,
    path = "/api/stores/{id}",
    params(("id" = String, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store removed", body = MessageResponse),
        (status = 403, description = "Caller is not the manager", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub(crate) async fn delete_store(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = extract_path(id)?;
    let _guard = state.mutation_lock.lock().await;
    let store = resolve_store(&state, &id)?;
    check_store(&store, Some(&caller.id), AccessScope::ManagerOnly)
        .map_err(|e| e.forbidden("delete_store", Some(&caller.id)))?;

    let remaining: Vec<StoreRecord> = state
        .stores
        .list()
        .into_iter()
        .filter(|s| s.id != store.id)
        .collect();
    let roles: Vec<_> = std::iter::once(store.manager)
        .chain(store.staff.iter().copied())
        .map(|user| (user, role_from_membership(&user, &remaining)))
        .collect();

    if let Some(pool) = &state.db_pool {
        crate::db::stores::delete_cascade(pool, store.id, &roles).await?;
    }
    let removed = state.products.remove_where(|p| p.store_id == store.id);
    state.stores.remove(&store.id);
    for (user, role) in &roles {
        state.users.update(user, |u| u.role = *role);
    }

    tracing::info!(
        store_id = %store.id,
        products_removed = removed.len(),
        "store deleted"
    );
    metrics::counter!("mart_stores_deleted_total").increment(1);

    Ok(Json(MessageResponse::new(format!("store {} removed", store.name))))
}
