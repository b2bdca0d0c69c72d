//! Upload error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors produced while accepting an upload.
///
/// Display strings of the declaration variants are part of the wire contract:
/// they are returned verbatim as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Content-Length not present in header")]
    MissingContentLength,

    #[error("Content-Length is not a valid byte count: {0}")]
    InvalidContentLength(String),

    #[error("Too big file")]
    PayloadTooLarge { declared: u64, limit: u64 },

    #[error("Content-Type header not present")]
    MissingContentType,

    #[error("Content-Type is not multipart/form-data")]
    UnsupportedMediaType,

    #[error("boundary not found")]
    MissingBoundary,

    /// The part framing or its headers could not be understood.
    #[error("Malformed multipart body: {0}")]
    MalformedPart(String),

    /// More bytes arrived than the request declared.
    #[error("Request body exceeds declared Content-Length of {declared} bytes")]
    BodyOverflow { declared: u64 },

    /// The transport closed before the terminal boundary was seen.
    #[error("Stream closed before upload completed")]
    StreamClosed,

    #[error("No body data received for {0} seconds")]
    IdleTimeout(u64),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

impl UploadError {
    /// Errors detected from the request headers alone, before any body byte.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            UploadError::MissingContentLength
                | UploadError::InvalidContentLength(_)
                | UploadError::PayloadTooLarge { .. }
                | UploadError::MissingContentType
                | UploadError::UnsupportedMediaType
                | UploadError::MissingBoundary
        )
    }

    /// HTTP status used when reporting this error.
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingContentLength => "missing_content_length",
            UploadError::InvalidContentLength(_) => "invalid_content_length",
            UploadError::PayloadTooLarge { .. } => "payload_too_large",
            UploadError::MissingContentType => "missing_content_type",
            UploadError::UnsupportedMediaType => "unsupported_media_type",
            UploadError::MissingBoundary => "missing_boundary",
            UploadError::MalformedPart(_) => "malformed_part",
            UploadError::BodyOverflow { .. } => "body_overflow",
            UploadError::StreamClosed => "stream_closed",
            UploadError::IdleTimeout(_) => "idle_timeout",
            UploadError::Io(_) => "io",
        }
    }
}
