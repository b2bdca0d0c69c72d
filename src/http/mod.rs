//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id + trace middleware)
//!     → handler.rs (declaration checks, body streamed into the receiver)
//!     → response.rs (JSON result or error page)
//!     → downstream consumer gets the stored path
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{CompletedUpload, UploadServer};
