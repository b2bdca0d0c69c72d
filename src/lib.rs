//! Streaming multipart upload server library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upload;

pub use config::UploadServerConfig;
pub use http::{CompletedUpload, UploadServer};
pub use lifecycle::Shutdown;
pub use upload::{UploadError, UploadOutcome, UploadReceiver};
