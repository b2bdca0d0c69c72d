//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the upload and health handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener and shut down gracefully

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::UploadServerConfig;
use crate::http::handler::upload_handler;
use crate::http::request::X_REQUEST_ID;
use crate::lifecycle::shutdown::wait_for;

/// Handed to the downstream consumer after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub request_id: String,
    /// Server-generated storage path.
    pub path: String,
    pub client_filename: Option<String>,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub max_streamed_size: u64,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upload: Arc<UploadSettings>,
    pub idle_timeout: Duration,
    pub serve_traceback: bool,
    pub consumer: Option<mpsc::UnboundedSender<CompletedUpload>>,
}

/// HTTP server accepting streamed uploads.
pub struct UploadServer {
    config: UploadServerConfig,
    consumer: Option<mpsc::UnboundedSender<CompletedUpload>>,
}

impl UploadServer {
    pub fn new(config: UploadServerConfig) -> Self {
        Self {
            config,
            consumer: None,
        }
    }

    /// Forward the storage path of every stored upload to `tx`.
    pub fn with_consumer(mut self, tx: mpsc::UnboundedSender<CompletedUpload>) -> Self {
        self.consumer = Some(tx);
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            upload: Arc::new(UploadSettings {
                directory: PathBuf::from(&self.config.upload.directory),
                max_streamed_size: self.config.upload.max_streamed_size,
            }),
            idle_timeout: Duration::from_secs(self.config.timeouts.idle_secs),
            serve_traceback: self.config.debug.serve_traceback,
            consumer: self.consumer.clone(),
        };

        Router::new()
            .route(&self.config.upload.endpoint, post(upload_handler))
            .route("/health", get(health))
            .with_state(state)
            // Size limits are enforced from the declared Content-Length.
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.config.upload.endpoint,
            directory = %self.config.upload.directory,
            "HTTP server starting"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
