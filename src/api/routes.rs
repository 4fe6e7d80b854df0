//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::error::AppError;
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware - generates/propagates request IDs, stamps error bodies
/// 2. Logging middleware - logs requests with request IDs
/// 3. Global error handler - normalizes bare error responses
/// 4. Timeout
///
/// # Routes
/// - `/jobs/...` - Catalog and application intake
/// - `/api/jobs` - Machine-readable catalog
/// - `/health`, `/health/ready`, `/health/live` - Probes
/// - `/swagger-ui` - API documentation
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::jobs::job_routes())
        .nest("/api", handlers::jobs::api_job_routes())
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, api))
        .fallback(route_not_found)
        .layer(timeout_layer(request_timeout))
        // Middleware is applied in reverse order - last added runs first
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Requests still running after `request_timeout` end with 408.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found("route", "path", uri.path())
}
