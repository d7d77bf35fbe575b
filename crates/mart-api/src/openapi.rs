//! # OpenAPI Specification Assembly
//!
//! Collects every utoipa-documented route into one OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the Bearer JWT security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/register or /api/login."))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the marketplace API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mart API",
        description = "Marketplace backend: users, stores with manager and staff, and store-scoped products.\n\nRead endpoints accept an optional Bearer token; members of a store receive the extended view of its resources."
    ),
    paths(
        crate::routes::users::register,
        crate::routes::users::login,
        crate::routes::users::list_users,
        crate::routes::stores::list_stores,
        crate::routes::stores::get_store,
        crate::routes::stores::create_store,
        crate::routes::stores::add_staff,
        crate::routes::stores::delete_store,
        crate::routes::products::list_products,
        crate::routes::products::get_product,
        crate::routes::products::create_product,
        crate::routes::products::update_product,
        crate::routes::products::delete_product,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::routes::MessageResponse,
            crate::routes::users::RegisterRequest,
            crate::routes::users::LoginRequest,
            crate::routes::users::AuthResponse,
            crate::routes::stores::CreateStoreRequest,
            crate::routes::stores::AddStaffRequest,
            crate::routes::stores::StoreList,
            crate::routes::products::CreateProductRequest,
            crate::routes::products::UpdateProductRequest,
            crate::routes::products::ProductList,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration and login"),
        (name = "stores", description = "Stores, managers, and staff"),
        (name = "products", description = "Store-scoped products"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
