//! Streaming upload receiver.
//!
//! One [`UploadReceiver`] exists per upload request. Chunks must be fed in
//! arrival order; the receiver is not shared between tasks.
//!
//! # Exit paths
//! ```text
//! feed() error      → release file, resolve completion as failed
//! finish()          → close file, compare sizes, resolve completion
//! abort() / drop    → release file, resolve completion as stream closed
//! ```

use std::path::{Path, PathBuf};

use tokio::sync::oneshot;

use crate::upload::error::{UploadError, UploadResult};
use crate::upload::header::UploadDeclaration;
use crate::upload::parser::{BodyParser, ParseState};
use crate::upload::target::UploadTarget;

/// A file that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub client_filename: Option<String>,
    /// Payload size implied by the declared Content-Length.
    pub declared_size: u64,
    /// Bytes actually written.
    pub actual_size: u64,
}

/// How an upload ended once the request body was fully consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored(StoredUpload),
    /// The file is kept; the caller decides what to do with it.
    SizeMismatch(StoredUpload),
}

impl UploadOutcome {
    pub fn stored(&self) -> &StoredUpload {
        match self {
            UploadOutcome::Stored(stored) | UploadOutcome::SizeMismatch(stored) => stored,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadOutcome::Stored(_) => "stored",
            UploadOutcome::SizeMismatch(_) => "size_mismatch",
        }
    }
}

/// Final notification delivered through [`UploadReceiver::completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Finished(UploadOutcome),
    Failed { kind: &'static str, message: String },
}

impl Completion {
    fn failed(err: &UploadError) -> Self {
        Completion::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Drives the body parser and the storage file for a single request.
#[derive(Debug)]
pub struct UploadReceiver {
    parser: BodyParser,
    upload_dir: PathBuf,
    target: Option<UploadTarget>,
    completion: Option<oneshot::Sender<Completion>>,
    closed: bool,
}

impl UploadReceiver {
    pub fn new(declaration: &UploadDeclaration, upload_dir: impl AsRef<Path>) -> Self {
        Self {
            parser: BodyParser::new(declaration),
            upload_dir: upload_dir.as_ref().to_path_buf(),
            target: None,
            completion: None,
            closed: false,
        }
    }

    /// Subscribe to the final result of this upload.
    ///
    /// Only one subscriber is kept; a second call replaces the first.
    pub fn completion(&mut self) -> oneshot::Receiver<Completion> {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(tx);
        rx
    }

    pub fn state(&self) -> ParseState {
        self.parser.state()
    }

    /// Path of the storage file, once the body has been reached.
    pub fn path(&self) -> Option<&Path> {
        self.target.as_ref().map(UploadTarget::path)
    }

    pub fn bytes_written(&self) -> u64 {
        self.target.as_ref().map_or(0, UploadTarget::bytes_written)
    }

    /// Feed the next chunk of the request body.
    ///
    /// On error the file handle is released and the receiver refuses further input.
    pub async fn feed(&mut self, chunk: &[u8]) -> UploadResult<()> {
        if self.closed {
            return Err(UploadError::StreamClosed);
        }

        match self.consume(chunk).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn consume(&mut self, chunk: &[u8]) -> UploadResult<()> {
        let advance = self.parser.push(chunk)?;
        if !advance.in_body {
            return Ok(());
        }

        if self.target.is_none() {
            self.target = Some(UploadTarget::create(&self.upload_dir).await?);
        }
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };

        if !advance.payload.is_empty() {
            target.write(&advance.payload).await?;
        }
        if advance.complete {
            target.flush().await?;
        }
        Ok(())
    }

    /// End of request: close the file and compare stored against declared size.
    pub async fn finish(&mut self) -> UploadResult<UploadOutcome> {
        if self.closed {
            return Err(UploadError::StreamClosed);
        }

        match self.complete().await {
            Ok(outcome) => {
                self.closed = true;
                self.resolve(Completion::Finished(outcome.clone()));
                Ok(outcome)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn complete(&mut self) -> UploadResult<UploadOutcome> {
        let (target, declared_size) = match (self.target.as_mut(), self.parser.expected_payload()) {
            (Some(target), Some(expected)) => (target, expected),
            _ => {
                return Err(UploadError::MalformedPart(
                    "request ended before the part headers were complete".into(),
                ))
            }
        };

        target.close().await?;

        let stored = StoredUpload {
            path: target.path().to_path_buf(),
            client_filename: self.parser.client_filename().map(str::to_string),
            declared_size,
            actual_size: target.bytes_written(),
        };

        let terminated = self.parser.state() == ParseState::Complete;
        if terminated && stored.actual_size == stored.declared_size {
            tracing::info!(
                path = %stored.path.display(),
                size = stored.actual_size,
                "Upload stored"
            );
            Ok(UploadOutcome::Stored(stored))
        } else {
            tracing::warn!(
                path = %stored.path.display(),
                declared_size = stored.declared_size,
                actual_size = stored.actual_size,
                terminated,
                "Upload finished with size mismatch"
            );
            Ok(UploadOutcome::SizeMismatch(stored))
        }
    }

    /// The transport went away before the upload completed.
    pub fn abort(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!(
            written = self.bytes_written(),
            bytes_left = self.parser.bytes_left(),
            "Upload aborted"
        );
        self.fail(&UploadError::StreamClosed);
    }

    fn fail(&mut self, err: &UploadError) {
        self.closed = true;
        if let Some(target) = self.target.as_mut() {
            target.release();
        }
        self.resolve(Completion::failed(err));
    }

    fn resolve(&mut self, completion: Completion) {
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(completion);
        }
    }
}

impl Drop for UploadReceiver {
    fn drop(&mut self) {
        self.abort();
    }
}
