//! Storage file for one upload.
//!
//! # Responsibilities
//! - Pick a server-generated name (UUID v4), never the client filename
//! - Own the file handle exclusively for one request
//! - Close exactly once; later closes are no-ops
//!
//! Partial files are left on disk when an upload is cut short.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// An open, exclusively owned upload file.
#[derive(Debug)]
pub struct UploadTarget {
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl UploadTarget {
    /// Create a fresh file under `dir`, creating the directory if needed.
    pub async fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(Uuid::new_v4().to_string());
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        tracing::debug!(path = %path.display(), "Upload target created");

        Ok(Self {
            path,
            file: Some(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(closed_error)?;
        file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush().await,
            None => Ok(()),
        }
    }

    /// Flush, sync and release the handle. Closing twice is a no-op.
    pub async fn close(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
            tracing::trace!(path = %self.path.display(), bytes = self.written, "Upload target closed");
        }
        Ok(())
    }

    /// Drop the handle without flushing. Used on cancellation paths.
    pub fn release(&mut self) {
        if self.file.take().is_some() {
            tracing::trace!(path = %self.path.display(), bytes = self.written, "Upload target released");
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "upload target already closed")
}
