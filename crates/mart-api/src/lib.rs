//! # mart-api — Axum API for the Marketplace
//!
//! Users register and log in; any user may open a store and becomes its
//! manager; managers add staff; manager and staff maintain the store's
//! products. Reads are public, and members of a store see the extended
//! view of its resources.
//!
//! ## API Surface
//!
//! | Prefix             | Module                | Auth                 |
//! |--------------------|-----------------------|----------------------|
//! | `/api/register`, `/api/login`, `/api/users` | [`routes::users`] | none |
//! | `/api/stores/*`    | [`routes::stores`]    | optional / required  |
//! | `/api/products/*`  | [`routes::products`]  | optional / required  |
//! | `/health/*`, `/metrics`, `/openapi.json` | here, [`openapi`] | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → [AuthMiddleware] → Handler
//! ```
//!
//! Auth runs only on the store and product routes.

pub mod access;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let debug_routes = !state.config.environment.is_production();

    let with_identity = Router::new()
        .merge(routes::stores::router())
        .merge(routes::products::router())
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    let api = Router::new()
        .merge(routes::users::router(debug_routes))
        .merge(with_identity);

    Router::new()
        .nest("/api", api)
        .merge(openapi::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("route not found".into())
}

/// Liveness check.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check. Returns 503 when the database is configured but
/// unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics — Prometheus scrape endpoint.
///
/// Refreshes the entity gauges from the stores, then renders the
/// recorder installed by the binary.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let Some(handle) = &state.metrics else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed".to_string())
            .into_response();
    };

    metrics::gauge!("mart_users").set(state.users.len() as f64);
    metrics::gauge!("mart_stores").set(state.stores.len() as f64);
    metrics::gauge!("mart_products").set(state.products.len() as f64);

    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}
