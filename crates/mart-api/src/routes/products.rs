//! # Products API
//!
//! Products belong to one store. Its manager and staff may create,
//! update, and delete them; anyone may read them. Every authorization
//! failure on a product, including an unknown or malformed `store_id`,
//! is reported as 403.
//!
//! Listing is filtered to the caller's stores when a caller is present
//! and is the whole catalogue otherwise.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use mart_core::authz::{detail_for, stores_for};
use mart_core::model::parse_price;
use mart_core::{
    project, AccessScope, Detail, NameFilter, Page, ProductId, ProductRecord, ProductView,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::access::{authorize_owner, authorize_store};
use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{
    extract_json, extract_path, extract_query, extract_validated_json, is_blank, parse_id, Validate,
};
use crate::routes::{ListQuery, MessageResponse};
use crate::state::AppState;

/// Product creation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Product name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Image location.
    pub image_url: Option<String>,
    /// Owning store.
    pub store_id: Option<String>,
    /// Price in minor units, as a number or numeric string.
    #[schema(value_type = Option<Object>)]
    pub price: Option<serde_json::Value>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.name) || is_blank(&self.store_id) {
            return Err("product name and store_id are required".to_string());
        }
        Ok(())
    }
}

/// Product update request. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    /// New name. Ignored when blank.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New image location.
    pub image_url: Option<String>,
    /// New price. Ignored unless numeric.
    #[schema(value_type = Option<Object>)]
    pub price: Option<serde_json::Value>,
}

impl UpdateProductRequest {
    fn apply(self, product: &mut ProductRecord) {
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            product.name = name;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if self.image_url.is_some() {
            product.image_url = self.image_url;
        }
        if let Ok(Some(price)) = parse_price(self.price.as_ref()) {
            product.price = price;
        }
    }
}

/// One page of products.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    /// Items skipped.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
    /// Items on this page.
    pub count: usize,
    /// Matching items across all pages.
    pub total_count: usize,
    /// Projected products.
    #[schema(value_type = Vec<Object>)]
    pub products: Vec<ProductView>,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// GET /api/products — List and search products.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of products", body = ProductList),
    ),
    tag = "products"
)]
pub(crate) async fn list_products(
    State(state): State<AppState>,
    caller: Option<Caller>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ProductList>, AppError> {
    let query = extract_query(query)?;
    let page = Page::from_query(query.offset.as_deref(), query.limit.as_deref());
    let filter = query.term.as_deref().and_then(NameFilter::new);
    let principal = caller.as_ref().map(|c| c.id);

    let stores: HashMap<_, _> = state.stores.list().into_iter().map(|s| (s.id, s)).collect();
    let scope = principal.map(|p| stores_for(&p, stores.values()));

    let mut products: Vec<ProductRecord> = state
        .products
        .list()
        .into_iter()
        .filter(|p| scope.as_ref().map_or(true, |ids| ids.contains(&p.store_id)))
        .filter(|p| filter.as_ref().map_or(true, |f| f.matches(&p.name)))
        .collect();
    products.sort_by_key(|p| p.created_at);
    let total_count = products.len();

    let products: Vec<ProductView> = page
        .slice(products)
        .iter()
        .map(|p| {
            let detail = detail_for(stores.get(&p.store_id), principal.as_ref());
            project(p, &state, detail)
        })
        .collect();

    Ok(Json(ProductList {
        offset: page.offset,
        limit: page.limit,
        count: products.len(),
        total_count,
        products,
    }))
}

/// GET /api/products/{id} — Read one product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product, extended for its store's members"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    caller: Option<Caller>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<ProductView>, AppError> {
    let product = find_product(&state, &extract_path(id)?)?;
    let store = state.stores.get(&product.store_id);
    let detail = detail_for(store.as_ref(), caller.as_ref().map(|c| &c.id));
    Ok(Json(project(&product, &state, detail)))
}

/// POST /api/products — Create a product in a store the caller works at.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created, extended view"),
        (status = 400, description = "Missing fields or invalid price", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Not a member of the store", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let req = extract_validated_json(body)?;
    let price = parse_price(req.price.as_ref())?.unwrap_or_default();
    let raw_store_id = req.store_id.unwrap_or_default();

    let _guard = state.mutation_lock.lock().await;
    let store = authorize_store(&state, &raw_store_id, Some(&caller.id), AccessScope::ManagerOrStaff)
        .map_err(|e| e.forbidden("create_product", Some(&caller.id)))?;

    let product = ProductRecord {
        id: ProductId::new(),
        name: req.name.unwrap_or_default().trim().to_string(),
        description: req.description,
        image_url: req.image_url,
        price,
        store_id: store.id,
        created_by: caller.id,
        created_at: Utc::now(),
    };
    if let Some(pool) = &state.db_pool {
        crate::db::products::insert(pool, &product).await?;
    }
    state.products.insert(product.id, product.clone());
    state.stores.update(&store.id, |s| s.link_product(product.id));

    tracing::info!(product_id = %product.id, store_id = %store.id, "product created");
    metrics::counter!("mart_products_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(project(&product, &state, Detail::Extended))))
}

/// PUT /api/products/{id} — Update a product.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated, extended view"),
        (status = 403, description = "Not a member of the store", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub(crate) async fn update_product(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductView>, AppError> {
    let id = extract_path(id)?;
    let _guard = state.mutation_lock.lock().await;
    let mut product = find_product(&state, &id)?;
    authorize_owner(&state, product.store_id, Some(&caller.id), AccessScope::ManagerOrStaff)
        .map_err(|e| e.forbidden("update_product", Some(&caller.id)))?;

    extract_json(body)?.apply(&mut product);
    if let Some(pool) = &state.db_pool {
        let written = crate::db::products::update(pool, &product).await?;
        ensure_persisted(written, &product.id)?;
    }
    state.products.insert(product.id, product.clone());

    tracing::debug!(product_id = %product.id, "product updated");
    Ok(Json(project(&product, &state, Detail::Extended)))
}

/// DELETE /api/products/{id} — Delete a product.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product removed", body = MessageResponse),
        (status = 403, description = "Not a member of the store", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub(crate) async fn delete_product(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = extract_path(id)?;
    let _guard = state.mutation_lock.lock().await;
    let product = find_product(&state, &id)?;
    authorize_owner(&state, product.store_id, Some(&caller.id), AccessScope::ManagerOrStaff)
        .map_err(|e| e.forbidden("delete_product", Some(&caller.id)))?;

    if let Some(pool) = &state.db_pool {
        let written = crate::db::products::delete(pool, product.id).await?;
        ensure_persisted(written, &product.id)?;
    }
    state.products.remove(&product.id);
    state
        .stores
        .update(&product.store_id, |s| s.unlink_product(&product.id));

    tracing::info!(product_id = %product.id, "product deleted");
    metrics::counter!("mart_products_deleted_total").increment(1);

    Ok(Json(MessageResponse::new(format!("product {} removed", product.name))))
}

/// A write that matched no row means the database and memory disagree.
fn ensure_persisted(written: bool, id: &ProductId) -> Result<(), AppError> {
    if written {
        Ok(())
    } else {
        Err(AppError::Internal(format!("product {id} missing from database")))
    }
}

fn find_product(state: &AppState, raw: &str) -> Result<ProductRecord, AppError> {
    let id: ProductId = parse_id(raw.trim())?;
    state
        .products
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mart_core::{StoreId, UserId};
    use serde_json::json;

    fn product() -> ProductRecord {
        ProductRecord {
            id: ProductId::new(),
            name: "Camiseta".into(),
            description: Some("Algodão".into()),
            image_url: None,
            price: 4990,
            store_id: StoreId::new(),
            created_by: UserId::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn update_applies_present_fields() {
        let mut p = product();
        UpdateProductRequest {
            name: Some("Boné".into()),
            image_url: Some("http://img".into()),
            price: Some(json!("1500")),
            ..Default::default()
        }
        .apply(&mut p);
        assert_eq!(p.name, "Boné");
        assert_eq!(p.image_url.as_deref(), Some("http://img"));
        assert_eq!(p.description.as_deref(), Some("Algodão"));
        assert_eq!(p.price, 1500);
    }

    #[test]
    fn update_keeps_price_when_not_numeric() {
        let mut p = product();
        UpdateProductRequest {
            price: Some(json!("caro")),
            ..Default::default()
        }
        .apply(&mut p);
        assert_eq!(p.price, 4990);
    }

    #[test]
    fn update_ignores_blank_name() {
        let mut p = product();
        UpdateProductRequest {
            name: Some("  ".into()),
            ..Default::default()
        }
        .apply(&mut p);
        assert_eq!(p.name, "Camiseta");
    }

    #[test]
    fn unmatched_database_write_is_internal() {
        let id = ProductId::new();
        assert!(ensure_persisted(true, &id).is_ok());
        let err = ensure_persisted(false, &id).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn create_requires_name_and_store() {
        let req = CreateProductRequest {
            name: Some("P".into()),
            description: None,
            image_url: None,
            store_id: None,
            price: None,
        };
        assert!(req.validate().is_err());
    }
}
