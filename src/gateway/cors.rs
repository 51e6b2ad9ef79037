//! Cross-origin and method policy.
//!
//! Only GET, POST, PUT, PATCH and DELETE reach the route multiplexer. Any
//! other method is answered with 405 before routing. Preflight `OPTIONS`
//! requests are answered by the CORS layer itself.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};

/// Methods the gateway serves.
pub const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

const ALLOW_HEADER_VALUE: &str = "GET, POST, PUT, PATCH, DELETE";

/// CORS headers for browser callers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS.to_vec())
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Reject methods outside [`ALLOWED_METHODS`].
pub async fn method_gate(request: Request<Body>, next: Next) -> Response {
    if ALLOWED_METHODS.contains(request.method()) {
        return next.run(request).await;
    }

    tracing::debug!(method = %request.method(), path = %request.uri().path(), "Method not allowed");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static(ALLOW_HEADER_VALUE))],
        "Method not allowed",
    )
        .into_response()
}
