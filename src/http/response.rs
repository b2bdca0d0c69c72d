//! Upload response rendering.
//!
//! | Result                     | Status | Body                                         |
//! |----------------------------|--------|----------------------------------------------|
//! | stored                     | 200    | `{"filename": "<server path>"}`              |
//! | size mismatch              | 200    | `{"error": "Upload finish but size mismatch!"}` |
//! | client / declaration error | 400    | `{"error": "<message>"}`                     |
//! | internal error             | 500    | diagnostic text or generic HTML page         |

use std::error::Error as _;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::upload::{UploadError, UploadOutcome};

pub const SIZE_MISMATCH_MESSAGE: &str = "Upload finish but size mismatch!";

/// Response for an upload whose body was fully consumed.
pub fn outcome_response(outcome: &UploadOutcome) -> Response {
    match outcome {
        UploadOutcome::Stored(stored) => {
            Json(json!({ "filename": stored.path.to_string_lossy() })).into_response()
        }
        UploadOutcome::SizeMismatch(_) => Json(json!({ "error": SIZE_MISMATCH_MESSAGE })).into_response(),
    }
}

/// Response for a failed upload.
///
/// Expected rejections always carry their message. Anything else only exposes
/// detail when `serve_traceback` is set.
pub fn error_response(err: &UploadError, serve_traceback: bool) -> Response {
    let status = err.status();
    if status.is_client_error() {
        return (status, Json(json!({ "error": err.to_string() }))).into_response();
    }

    if serve_traceback {
        let mut text = format!("{}\n{:?}\n", err, err);
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(&format!("caused by: {}\n", cause));
            source = cause.source();
        }
        return (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response();
    }

    generic_error_page(status)
}

fn generic_error_page(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let page = format!(
        "<html><title>{code}: {reason}</title><body>{code}: {reason}</body></html>",
        code = status.as_u16(),
        reason = reason
    );
    (status, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], page).into_response()
}
