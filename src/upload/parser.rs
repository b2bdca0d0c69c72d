//! Incremental multipart body parser.
//!
//! # States
//! ```text
//! Header ──(part headers + separator seen)──▶ Body ──(tail == boundary end)──▶ Complete
//! ```
//!
//! The parser owns no I/O. Each [`BodyParser::push`] returns the payload bytes
//! that are safe to store; the caller decides where they go.
//!
//! Two counters are kept on purpose: `bytes_left` counts raw bytes still to
//! arrive (framing included) and drives terminator detection, while
//! `expected_payload` is fixed at the Header→Body transition and is only
//! compared against the stored size once the request ends.

use bytes::{Buf, Bytes, BytesMut};

use crate::upload::error::{UploadError, UploadResult};
use crate::upload::framing::{Framing, SEPARATOR};
use crate::upload::header::{content_disposition_filename, UploadDeclaration};

/// Upper bound on an unterminated part header block.
pub const MAX_PART_HEADER_SIZE: usize = 64 * 1024;

/// Which section of the multipart envelope is being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Waiting for the opening boundary and part headers.
    Header,
    /// Streaming payload bytes.
    Body,
    /// Terminal boundary observed; further input is ignored.
    Complete,
}

/// Result of feeding one chunk.
#[derive(Debug, Default)]
pub struct Advance {
    /// The parser is past the part headers.
    pub in_body: bool,
    /// Payload bytes released by this chunk.
    pub payload: Bytes,
    /// This chunk carried the end of the terminal boundary.
    pub complete: bool,
}

/// Incremental parser for a body holding exactly one file part.
#[derive(Debug)]
pub struct BodyParser {
    framing: Framing,
    content_length: u64,
    state: ParseState,
    pending: BytesMut,
    bytes_left: u64,
    expected_payload: Option<u64>,
    client_filename: Option<String>,
}

impl BodyParser {
    pub fn new(declaration: &UploadDeclaration) -> Self {
        Self {
            framing: Framing::new(&declaration.boundary),
            content_length: declaration.content_length,
            state: ParseState::Header,
            pending: BytesMut::new(),
            bytes_left: declaration.content_length,
            expected_payload: None,
            client_filename: None,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Raw bytes the request has yet to deliver.
    pub fn bytes_left(&self) -> u64 {
        self.bytes_left
    }

    /// Payload size implied by the declared length, known once in Body.
    pub fn expected_payload(&self) -> Option<u64> {
        self.expected_payload
    }

    /// Filename sent by the client. Informational only.
    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    /// Bytes held back awaiting classification.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the next chunk of the request body.
    pub fn push(&mut self, chunk: &[u8]) -> UploadResult<Advance> {
        if self.state == ParseState::Complete {
            tracing::debug!(len = chunk.len(), "Ignoring data after terminal boundary");
            return Ok(Advance {
                in_body: true,
                ..Advance::default()
            });
        }

        let len = chunk.len() as u64;
        if len > self.bytes_left {
            return Err(UploadError::BodyOverflow {
                declared: self.content_length,
            });
        }
        self.bytes_left -= len;
        self.pending.extend_from_slice(chunk);

        if self.state == ParseState::Header && !self.parse_part_headers()? {
            return Ok(Advance::default());
        }

        Ok(self.drain_body())
    }

    /// Returns true once the header block has been consumed.
    fn parse_part_headers(&mut self) -> UploadResult<bool> {
        let start = self.framing.boundary_start();
        if self.pending.starts_with(start) {
            self.pending.advance(start.len());
        }

        let position = match find(&self.pending, SEPARATOR) {
            Some(position) => position,
            None => {
                if self.pending.len() > MAX_PART_HEADER_SIZE + start.len() {
                    return Err(UploadError::MalformedPart(format!(
                        "part headers exceed {} bytes",
                        MAX_PART_HEADER_SIZE
                    )));
                }
                return Ok(false);
            }
        };

        // Empty header block: the separator may still belong to a split boundary.
        if position == 0 {
            return Ok(false);
        }

        let header_block = self.pending.split_to(position);
        self.pending.advance(SEPARATOR.len());

        let filename = content_disposition_filename(&header_block)?;
        let expected = self
            .framing
            .payload_size(self.content_length, header_block.len())
            .ok_or_else(|| {
                UploadError::MalformedPart("declared Content-Length is shorter than the part framing".into())
            })?;

        tracing::debug!(
            client_filename = %filename,
            expected_payload = expected,
            "Part headers parsed"
        );

        self.client_filename = Some(filename);
        self.expected_payload = Some(expected);
        self.state = ParseState::Body;
        Ok(true)
    }

    fn drain_body(&mut self) -> Advance {
        let end_len = self.framing.boundary_end().len();

        let payload = if self.pending.ends_with(self.framing.boundary_end()) {
            let mut payload = self.pending.split();
            payload.truncate(payload.len() - end_len);
            self.state = ParseState::Complete;
            payload
        } else if self.bytes_left > end_len as u64 {
            // The terminator cannot have started yet.
            self.pending.split()
        } else {
            // Keep the tail that may be the start of a terminator still arriving.
            let hold = end_len - self.bytes_left as usize;
            let release = self.pending.len().saturating_sub(hold);
            self.pending.split_to(release)
        };

        Advance {
            in_body: true,
            payload: payload.freeze(),
            complete: self.state == ParseState::Complete,
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
