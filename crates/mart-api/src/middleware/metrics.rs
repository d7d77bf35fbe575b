//! # Request Metrics
//!
//! Records per-request counters and latency through the `metrics`
//! facade. The binary installs a Prometheus recorder and `/metrics`
//! renders it; without a recorder the macros are no-ops.
//!
//! | Metric                              | Kind      | Labels                    |
//! |-------------------------------------|-----------|---------------------------|
//! | `mart_http_requests_total`          | counter   | `method`, `path`, `status` |
//! | `mart_http_errors_total`            | counter   | `method`, `path`, `status` |
//! | `mart_http_request_duration_seconds` | histogram | `method`, `path`          |

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Label used for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Middleware that records request, error, and latency metrics.
///
/// Paths are labelled with the matched route template (`/api/products/{id}`)
/// so ids never become label values.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_PATH.to_string(), |p| p.as_str().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "mart_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    if response.status().is_client_error() || response.status().is_server_error() {
        metrics::counter!(
            "mart_http_errors_total",
            "method" => method.clone(),
            "path" => path.clone(),
            "status" => status
        )
        .increment(1);
    }
    metrics::histogram!(
        "mart_http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(started.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn passes_responses_through() {
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .layer(from_fn(metrics_middleware));

        let ok = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let missing = app
            .oneshot(axum::http::Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
