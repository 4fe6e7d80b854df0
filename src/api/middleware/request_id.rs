//! Request ID middleware for request tracing.
//!
//! This middleware ensures every request has a unique identifier for tracing
//! and correlation purposes. It either uses an existing X-Request-ID header
//! or generates a new UUID.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::error_handler::error_response;
use crate::api::dto::ErrorResponse;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID stored in request extensions for downstream access.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Middleware that ensures every request has a unique request ID.
///
/// # Behavior
/// - Uses the incoming X-Request-ID header when present, otherwise a new UUID v4
/// - Stores the request ID in request extensions for downstream handlers
/// - Adds the request ID to the response headers and to error bodies
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Some(body) = response.extensions_mut().remove::<ErrorResponse>() {
        let (parts, _) = response.into_parts();
        let mut stamped = error_response(parts.status, body.with_request_id(&request_id));
        // Keep every value of multi-valued headers such as `set-cookie`;
        // the re-rendered body brings its own length and content type.
        let mut headers = parts.headers;
        headers.remove(header::CONTENT_LENGTH);
        for (name, value) in stamped.headers() {
            headers.insert(name.clone(), value.clone());
        }
        *stamped.headers_mut() = headers;
        response = stamped;
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::response::AppendHeaders;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    use crate::error::AppError;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/expired",
                get(|| async {
                    (
                        AppendHeaders([
                            (header::SET_COOKIE, "session=; Max-Age=0"),
                            (header::SET_COOKIE, "draft=; Max-Age=0"),
                        ]),
                        AppError::not_found("job posting", "job_id", "X"),
                    )
                }),
            )
            .route(
                "/missing",
                get(|| async { AppError::not_found("job posting", "job_id", "X") }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let response = app()
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_propagates_request_id_into_error_body() {
        let response = app()
            .oneshot(
                Request::get("/missing")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.request_id.as_deref(), Some("req-42"));
    }

    #[tokio::test]
    async fn test_stamped_error_keeps_repeated_headers() {
        let response = app()
            .oneshot(Request::get("/expired").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, ["session=; Max-Age=0", "draft=; Max-Age=0"]);
        assert_eq!(
            response.headers().get_all(header::CONTENT_TYPE).iter().count(),
            1
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.request_id.is_some());
    }
}
