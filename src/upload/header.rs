//! Request declaration checks and part header parsing.
//!
//! # Responsibilities
//! - Validate Content-Length against the configured ceiling
//! - Require a `multipart/form-data` Content-Type and extract its boundary
//! - Read the client filename from a part's `Content-Disposition`
//!
//! All checks here run before the body is polled, so a rejected request
//! never touches storage.

use axum::http::{header, HeaderMap};

use crate::upload::error::{UploadError, UploadResult};

/// 20 GiB.
pub const DEFAULT_MAX_STREAMED_SIZE: u64 = 20 * 1024 * 1024 * 1024;

/// What the client declared about the upload in its request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDeclaration {
    pub content_length: u64,
    pub boundary: String,
}

/// Validate upload request headers and extract the multipart boundary.
pub fn parse_upload_headers(headers: &HeaderMap, max_size: u64) -> UploadResult<UploadDeclaration> {
    let raw_len = headers
        .get(header::CONTENT_LENGTH)
        .ok_or(UploadError::MissingContentLength)?;
    let content_length = raw_len
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| UploadError::InvalidContentLength(String::from_utf8_lossy(raw_len.as_bytes()).into_owned()))?;

    if content_length > max_size {
        return Err(UploadError::PayloadTooLarge {
            declared: content_length,
            limit: max_size,
        });
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or(UploadError::MissingContentType)?
        .to_str()
        .map_err(|_| UploadError::UnsupportedMediaType)?;

    let boundary = parse_boundary(content_type)?;

    Ok(UploadDeclaration {
        content_length,
        boundary,
    })
}

/// Extract the boundary token from a `multipart/form-data` Content-Type value.
pub fn parse_boundary(content_type: &str) -> UploadResult<String> {
    if !content_type.starts_with("multipart/form-data") {
        return Err(UploadError::UnsupportedMediaType);
    }

    let mut boundary = None;
    for field in content_type.split(';') {
        if let Some((key, value)) = field.trim().split_once('=') {
            if key == "boundary" && !value.is_empty() {
                boundary = Some(value);
            }
        }
    }

    let boundary = boundary.ok_or(UploadError::MissingBoundary)?;
    let boundary = boundary
        .strip_prefix('"')
        .and_then(|b| b.strip_suffix('"'))
        .unwrap_or(boundary);

    Ok(boundary.to_string())
}

/// Read the `filename` parameter of the `Content-Disposition` header in a part header block.
pub fn content_disposition_filename(header_block: &[u8]) -> UploadResult<String> {
    let text = std::str::from_utf8(header_block)
        .map_err(|_| UploadError::MalformedPart("part headers are not valid UTF-8".into()))?;

    let disposition = text
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-disposition"))
        .map(|(_, value)| value)
        .ok_or_else(|| UploadError::MalformedPart("Content-Disposition header not present".into()))?;

    split_params(disposition)
        .into_iter()
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| unquote(value.trim()))
        .ok_or_else(|| UploadError::MalformedPart("filename not found in Content-Disposition".into()))
}

/// Split header parameters on `;`, ignoring separators inside quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}
