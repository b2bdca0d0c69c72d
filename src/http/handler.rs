//! Streaming upload endpoint.
//!
//! # Request flow
//! ```text
//! headers → parse_upload_headers (reject before the body is polled)
//!         → UploadReceiver fed chunk by chunk, in arrival order
//!         → one terminal response
//! ```
//!
//! A background watcher awaits the receiver's completion signal so that
//! metrics and the downstream consumer see every exit path, including a
//! client that disconnects and drops this handler mid-stream.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::http::request::request_id;
use crate::http::response::{error_response, outcome_response};
use crate::http::server::{AppState, CompletedUpload};
use crate::observability::metrics::{self, InFlightGuard};
use crate::upload::{parse_upload_headers, Completion, UploadError, UploadOutcome, UploadReceiver, UploadResult};

pub async fn upload_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());
    let (parts, body) = request.into_parts();

    let declaration = match parse_upload_headers(&parts.headers, state.upload.max_streamed_size) {
        Ok(declaration) => declaration,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Upload rejected");
            metrics::record_upload(e.kind(), 0, start);
            return error_response(&e, state.serve_traceback);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        content_length = declaration.content_length,
        boundary = %declaration.boundary,
        "Upload accepted"
    );

    let mut receiver = UploadReceiver::new(&declaration, &state.upload.directory);
    tokio::spawn(watch_completion(receiver.completion(), state.clone(), request_id.clone(), start));

    match stream_body(&mut receiver, body, state.idle_timeout).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id, error = ?e, "Upload failed");
            } else {
                tracing::warn!(request_id = %request_id, error = %e, "Upload failed");
            }
            error_response(&e, state.serve_traceback)
        }
    }
}

/// Feed the request body through the receiver until it ends.
async fn stream_body(receiver: &mut UploadReceiver, body: Body, idle: Duration) -> UploadResult<UploadOutcome> {
    let mut stream = body.into_data_stream();

    loop {
        match tokio::time::timeout(idle, stream.next()).await {
            Ok(Some(Ok(chunk))) => receiver.feed(&chunk).await?,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "Request body stream failed");
                receiver.abort();
                return Err(UploadError::StreamClosed);
            }
            Ok(None) => break,
            Err(_) => {
                receiver.abort();
                return Err(UploadError::IdleTimeout(idle.as_secs()));
            }
        }
    }

    receiver.finish().await
}

async fn watch_completion(
    done: oneshot::Receiver<Completion>,
    state: AppState,
    request_id: String,
    start: Instant,
) {
    let _in_flight = InFlightGuard::new();

    let completion = match done.await {
        Ok(completion) => completion,
        Err(_) => Completion::Failed {
            kind: "stream_closed",
            message: UploadError::StreamClosed.to_string(),
        },
    };

    match completion {
        Completion::Finished(outcome) => {
            metrics::record_upload(outcome.label(), outcome.stored().actual_size, start);
            if let (UploadOutcome::Stored(stored), Some(consumer)) = (outcome, &state.consumer) {
                let upload = CompletedUpload {
                    request_id,
                    path: stored.path.to_string_lossy().into_owned(),
                    client_filename: stored.client_filename,
                    size: stored.actual_size,
                };
                if consumer.send(upload).is_err() {
                    tracing::warn!("Upload consumer has gone away");
                }
            }
        }
        Completion::Failed { kind, message } => {
            tracing::info!(request_id = %request_id, kind, message = %message, "Upload did not complete");
            metrics::record_upload(kind, 0, start);
        }
    }
}
