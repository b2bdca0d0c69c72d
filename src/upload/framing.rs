//! Multipart framing for a single file part.
//!
//! The body the receiver accepts is exactly:
//!
//! ```text
//! --<boundary>\r\n<part headers>\r\n\r\n<payload>\r\n--<boundary>--\r\n
//! ```

/// Separator between the part header block and the payload.
pub const SEPARATOR: &[u8] = b"\r\n\r\n";

/// Byte sequences derived from a boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framing {
    boundary_start: Vec<u8>,
    boundary_end: Vec<u8>,
}

impl Framing {
    pub fn new(boundary: &str) -> Self {
        Self {
            boundary_start: format!("--{}\r\n", boundary).into_bytes(),
            boundary_end: format!("\r\n--{}--\r\n", boundary).into_bytes(),
        }
    }

    /// `--<boundary>\r\n`
    pub fn boundary_start(&self) -> &[u8] {
        &self.boundary_start
    }

    /// `\r\n--<boundary>--\r\n`
    pub fn boundary_end(&self) -> &[u8] {
        &self.boundary_end
    }

    /// Expected payload size for a declared body length and a parsed header block.
    ///
    /// Returns `None` when the declared length cannot even hold the framing.
    pub fn payload_size(&self, content_length: u64, header_len: usize) -> Option<u64> {
        content_length
            .checked_sub(self.boundary_start.len() as u64)?
            .checked_sub(self.boundary_end.len() as u64)?
            .checked_sub(header_len as u64)?
            .checked_sub(SEPARATOR.len() as u64)
    }

    /// Body length a client must declare for the given header block and payload.
    pub fn content_length(&self, header_len: usize, payload_len: u64) -> u64 {
        (self.boundary_start.len() + header_len + SEPARATOR.len() + self.boundary_end.len()) as u64
            + payload_len
    }
}

/// Render the header block of a file part (without the trailing separator).
pub fn part_headers(field: &str, filename: &str) -> String {
    format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream",
        field, filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_markers() {
        let framing = Framing::new("XYZ");
        assert_eq!(framing.boundary_start(), b"--XYZ\r\n");
        assert_eq!(framing.boundary_end(), b"\r\n--XYZ--\r\n");
    }

    #[test]
    fn test_payload_size_inverts_content_length() {
        let framing = Framing::new("XYZ");
        let headers = part_headers("file", "a.bin");
        let len = framing.content_length(headers.len(), 500);
        assert_eq!(framing.payload_size(len, headers.len()), Some(500));
    }

    #[test]
    fn test_payload_size_rejects_short_declaration() {
        let framing = Framing::new("XYZ");
        assert_eq!(framing.payload_size(10, 40), None);
    }
}
