//! Request identification.
//!
//! The id is assigned by `tower_http::request_id` before the handler runs
//! and echoed back in the response.

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request id assigned by the middleware, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
