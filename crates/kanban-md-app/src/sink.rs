//! Destinations for generated board documents.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// Failure to persist a document.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The file system refused the write.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The host rejected the edit for another reason.
    #[error("document edit rejected: {0}")]
    Rejected(String),
}

/// Something that can replace the whole text of one document.
pub trait DocumentSink: Send + Sync + 'static {
    /// Replace the document contents with `text`.
    ///
    /// # Errors
    /// Returns [`SinkError`] when the text could not be persisted.
    fn write(&self, text: String) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink writing straight to a file on disk.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink for `path`; the file is created on first write if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSink for FileSink {
    fn write(&self, text: String) -> impl Future<Output = Result<(), SinkError>> + Send {
        let path = self.path.clone();
        async move {
            let result = tokio::fs::write(&path, text).await;
            result.map_err(|source| SinkError::Io { path, source })
        }
    }
}
