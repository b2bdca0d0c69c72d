//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → UploadServerConfig (validated, immutable)
//!     → cloned into the HTTP server state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::UploadServerConfig;
pub use schema::{DebugConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig, UploadConfig};
