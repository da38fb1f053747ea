//! Building the finished artifact and handing it to a sink.
//!
//! - [`ArtifactFinalizer`] - turns drained bytes and a display name into an [`Artifact`]
//! - [`sanitize`] - filesystem-safe naming with a stable fallback
//! - [`ArtifactSink`] - where artifacts go; [`FileSink`] writes them to a directory

mod file_sink;
mod filename;

pub use file_sink::FileSink;
pub use filename::{FALLBACK_NAME, sanitize};

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use filename::extension_for_mime;

/// MIME type used when the caller configures none.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// The finished, immutable result of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Bytes,
    mime_type: String,
    suggested_filename: String,
}

impl Artifact {
    /// Returns the payload.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Returns the payload length.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns `true` for an empty payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the MIME type the caller configured.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the sanitized filename, extension included.
    #[must_use]
    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }
}

/// Builds artifacts with a fixed MIME type.
///
/// The payload is never inspected; the MIME type comes from configuration.
#[derive(Debug, Clone)]
pub struct ArtifactFinalizer {
    mime_type: String,
}

impl Default for ArtifactFinalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIME_TYPE)
    }
}

impl ArtifactFinalizer {
    /// Creates a finalizer that tags artifacts with `mime_type`.
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
        }
    }

    /// Returns the configured MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Wraps `bytes` into an artifact named after `display_name`.
    #[must_use]
    pub fn finalize(&self, bytes: Bytes, display_name: &str) -> Artifact {
        let suggested_filename = format!(
            "{}{}",
            sanitize(display_name),
            extension_for_mime(&self.mime_type)
        );
        Artifact {
            bytes,
            mime_type: self.mime_type.clone(),
            suggested_filename,
        }
    }
}

/// Receipt returned by a sink after it accepted an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Where the artifact ended up, for sinks that store it on disk.
    pub location: Option<PathBuf>,
    /// Bytes delivered.
    pub bytes: u64,
}

/// Failure to save or export an artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Filesystem error while writing the artifact.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The sink refused the artifact.
    #[error("artifact rejected: {reason}")]
    Rejected {
        /// Why the sink refused.
        reason: String,
    },
}

impl SinkError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Platform-specific save/export of a finished artifact.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Takes ownership of the artifact and stores or exports it.
    async fn deliver(&self, artifact: Artifact) -> Result<Delivery, SinkError>;
}
