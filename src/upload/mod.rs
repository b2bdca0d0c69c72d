//! Streaming multipart upload subsystem.
//!
//! # Data Flow
//! ```text
//! request headers
//!     → header.rs (Content-Length / Content-Type / boundary checks)
//! body chunks, in order
//!     → parser.rs (Header → Body → Complete, releases payload bytes)
//!     → target.rs (UUID-named file, written as bytes arrive)
//! end of request
//!     → receiver.rs (close file, compare declared vs written size)
//! ```

pub mod error;
pub mod framing;
pub mod header;
pub mod parser;
pub mod receiver;
pub mod target;

pub use error::{UploadError, UploadResult};
pub use framing::Framing;
pub use header::{parse_upload_headers, UploadDeclaration, DEFAULT_MAX_STREAMED_SIZE};
pub use parser::{BodyParser, ParseState};
pub use receiver::{Completion, StoredUpload, UploadOutcome, UploadReceiver};
pub use target::UploadTarget;
