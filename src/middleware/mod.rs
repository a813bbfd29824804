//! HTTP middleware: request tracing and security headers

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Log each request with its outcome and timing.
///
/// Client-side failures (validation, business rules) log at warn so they
/// stay visible without polluting the error stream.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(%method, %path, status = %status.as_u16(), duration_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = %status.as_u16(), duration_ms, "Request rejected");
    } else {
        tracing::info!(%method, %path, status = %status.as_u16(), duration_ms, "Request completed");
    }

    response
}

/// Add standard security headers to every response
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
    );

    response
}
