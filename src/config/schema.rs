//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the upload server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::upload::DEFAULT_MAX_STREAMED_SIZE;

/// Root configuration for the upload server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UploadServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upload endpoint and storage settings.
    pub upload: UploadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Error reporting settings.
    pub debug: DebugConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5006").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5006".to_string(),
        }
    }
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Route accepting multipart POSTs.
    pub endpoint: String,

    /// Directory receiving uploaded files. Created on first upload.
    pub directory: String,

    /// Largest Content-Length accepted, in bytes.
    pub max_streamed_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "/upload".to_string(),
            directory: "data/upload".to_string(),
            max_streamed_size: DEFAULT_MAX_STREAMED_SIZE,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Maximum wait for the next body chunk before the upload is cancelled.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { idle_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Error reporting configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Return full diagnostics for unexpected errors instead of a generic page.
    pub serve_traceback: bool,
}
