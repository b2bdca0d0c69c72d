//! Streaming upload server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client POST /upload          ┌──────────────────────────────────────────────┐
//!     ─────────────────────────────┼─▶ http::server ─▶ http::handler              │
//!                                  │                     │                        │
//!                                  │        upload::header (declaration checks)   │
//!                                  │                     │                        │
//!                                  │        upload::receiver ◀── body chunks      │
//!                                  │          ├─ upload::parser (Header/Body)     │
//!                                  │          └─ upload::target (UUID file)       │
//!     JSON response                │                     │                        │
//!     ◀────────────────────────────┼── http::response ◀──┘                        │
//!                                  │                                              │
//!                                  │  config · observability · lifecycle          │
//!                                  └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use stream_upload::config::{load_config, UploadServerConfig};
use stream_upload::observability::{logging, metrics};
use stream_upload::{CompletedUpload, Shutdown, UploadServer};

#[derive(Parser)]
#[command(name = "stream-upload")]
#[command(about = "HTTP server receiving large multipart file uploads", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override upload.directory.
    #[arg(short, long)]
    upload_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => UploadServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(dir) = args.upload_dir {
        config.upload.directory = dir;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("stream-upload v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.upload.endpoint,
        max_streamed_size = config.upload.max_streamed_size,
        idle_secs = config.timeouts.idle_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Stand-in for the data-loading step: it only needs the stored path.
    let (tx, mut rx) = mpsc::unbounded_channel::<CompletedUpload>();
    tokio::spawn(async move {
        while let Some(upload) = rx.recv().await {
            tracing::info!(
                request_id = %upload.request_id,
                path = %upload.path,
                client_filename = upload.client_filename.as_deref().unwrap_or(""),
                size = upload.size,
                "Upload ready for loading"
            );
        }
    });

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    UploadServer::new(config)
        .with_consumer(tx)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
