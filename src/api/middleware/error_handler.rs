//! Error handler for converting AppError to HTTP responses.
//!
//! Every error body is an [`ErrorResponse`]. The rendered body is also kept
//! in the response extensions so the request-id middleware can stamp the
//! correlation id into it.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - NotFound → 404
    /// - Duplicate, Conflict → 409
    /// - Validation, ValidationErrors, BadRequest → 400
    /// - UnprocessableContent → 422
    /// - Database, Configuration, Internal → 500
    /// - Engine → 502
    /// - ConnectionPool → 503
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }

        let body = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => ErrorResponse::not_found_error(entity, field, value),
            AppError::Duplicate {
                entity,
                field,
                value,
            } => ErrorResponse::duplicate_error(entity, field, value),
            AppError::Validation { field, reason } => {
                ErrorResponse::validation_error(field, reason)
            }
            AppError::ValidationErrors { errors } => ErrorResponse::validation_errors(errors),
            AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
            AppError::Conflict { message } => ErrorResponse::new("CONFLICT", message),
            AppError::UnprocessableContent { message } => {
                ErrorResponse::new("UNPROCESSABLE_CONTENT", message)
            }
            AppError::Database { operation, .. } => ErrorResponse::new(
                "DATABASE_ERROR",
                &format!("Database operation failed: {}", operation),
            )
            .with_details(json!({ "operation": operation })),
            AppError::Engine { operation, .. } => ErrorResponse::new(
                "ENGINE_ERROR",
                &format!("Orchestration engine call failed: {}", operation),
            ),
            AppError::Configuration { key, .. } => ErrorResponse::new(
                "CONFIGURATION_ERROR",
                &format!("Configuration error: {}", key),
            ),
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
            }
            AppError::Internal { .. } => {
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            }
        };

        error_response(status, body)
    }
}

/// Build the JSON error response, keeping a copy of the body in extensions.
pub fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    let mut response = (status, Json(body.clone())).into_response();
    response.extensions_mut().insert(body);
    response
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AppError::Engine { .. } => StatusCode::BAD_GATEWAY,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Converts bare error responses (unknown routes, wrong methods, timeouts)
/// into the standard [`ErrorResponse`] format. JSON bodies pass through.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<ErrorResponse>().is_some()
        || is_json
    {
        return response;
    }

    let (_parts, body) = response.into_parts();
    let original = axum::body::to_bytes(body, 64 * 1024)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();

    let code = status
        .canonical_reason()
        .unwrap_or("Unknown Error")
        .to_uppercase()
        .replace([' ', '-'], "_");
    let message = if original.is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        original
    };

    error_response(status, ErrorResponse::new(&code, &message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("job posting", "job_id", "J-1"), 404),
            (
                AppError::Conflict {
                    message: "closed".to_string(),
                },
                409,
            ),
            (
                AppError::ValidationErrors { errors: Vec::new() },
                400,
            ),
            (
                AppError::engine("activate", anyhow::anyhow!("down")),
                502,
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("timed out"),
                },
                503,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error_to_status_code(&error).as_u16(), expected);
        }
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::not_found("job posting", "job_id", "J-1").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorResponse>().is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "NOT_FOUND");
        assert!(body.message.contains("J-1"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_source() {
        let response = AppError::Internal {
            source: anyhow::anyhow!("secret connection string"),
        }
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("secret"));
    }
}
