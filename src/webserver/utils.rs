/// JSON response helpers shared by all route handlers
use crate::core::error::ProxyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Serialize a payload as a 200 JSON response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// JSON error body with explicit status, code, and message
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": message,
            "code": code,
        })),
    )
        .into_response()
}

/// Map a service error onto the HTTP surface
///
/// Upstream error statuses are propagated; everything else is a 500.
pub fn proxy_error_response(err: &ProxyError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.code(), &err.to_string())
}
