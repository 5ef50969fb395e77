//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST   /shorten`  - Create a short URL
//! - `GET    /{code}`   - Redirect to the long URL
//! - `DELETE /{code}`   - Delete a short URL
//! - `GET    /health`   - Health check: database, remote cache
//! - `GET    /metrics`  - Prometheus metrics
//!
//! # Middleware
//!
//! - **Metrics** - Request count and latency per method and status
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{
    delete_handler, health_handler, metrics_handler, redirect_handler, shorten_handler,
};
use crate::api::middleware::{metrics, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the router with all routes and middleware, without path
/// normalization.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/{code}", get(redirect_handler).delete(delete_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), metrics::layer))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router, trimming trailing slashes before routing.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(api_router(state))
}
