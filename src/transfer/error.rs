//! Error types for transfer sessions.
//!
//! Every fatal condition of a session maps to one [`TransferError`] variant,
//! stored on the session as its last error. The length mismatch found at
//! end-of-data is not an error and lives in [`LengthMismatchWarning`].

use std::fmt;

use thiserror::Error;

use crate::artifact::SinkError;

/// Boxed cause of a failed chunk read.
pub type StreamFault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors that end a transfer session in the failed state.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The connection could not be opened, or the source answered with a
    /// non-success status or without a readable body.
    #[error("transport error fetching {locator}: {reason}")]
    Transport {
        /// Locator being fetched.
        locator: String,
        /// HTTP status code, when the source answered at all.
        status_code: Option<u16>,
        /// Short description of what went wrong.
        reason: String,
    },

    /// The response carried no usable `Content-Length`.
    #[error("no Content-Length for {locator}; transfers of unknown length are refused")]
    MissingLengthMetadata {
        /// Locator being fetched.
        locator: String,
    },

    /// The response declared a length of zero bytes.
    #[error("{locator} declares an empty body; nothing to transfer")]
    EmptyResource {
        /// Locator being fetched.
        locator: String,
    },

    /// A chunk read failed after streaming started.
    #[error("read failed after {received} bytes from {locator}: {cause}")]
    StreamRead {
        /// Locator being fetched.
        locator: String,
        /// Bytes received before the failure (all discarded).
        received: u64,
        /// Underlying read error.
        #[source]
        cause: StreamFault,
    },

    /// The transfer succeeded but the artifact could not be saved.
    #[error("transfer finished but saving failed: {0}")]
    Sink(#[from] SinkError),
}

/// Stable classification of a [`TransferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`TransferError::Transport`].
    Transport,
    /// See [`TransferError::MissingLengthMetadata`].
    MissingLengthMetadata,
    /// See [`TransferError::EmptyResource`].
    EmptyResource,
    /// See [`TransferError::StreamRead`].
    StreamRead,
    /// See [`TransferError::Sink`].
    Sink,
}

impl TransferError {
    /// Creates a transport error for a connection that never produced a response.
    pub fn connect(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            locator: locator.into(),
            status_code: None,
            reason: reason.into(),
        }
    }

    /// Creates a transport error for a non-success status.
    pub fn http_status(locator: impl Into<String>, status_code: u16) -> Self {
        Self::Transport {
            locator: locator.into(),
            status_code: Some(status_code),
            reason: format!("HTTP {status_code}"),
        }
    }

    /// Creates a transport error for a response without a readable body.
    pub fn missing_body(locator: impl Into<String>, status_code: u16) -> Self {
        Self::Transport {
            locator: locator.into(),
            status_code: Some(status_code),
            reason: format!("HTTP {status_code} response has no readable body"),
        }
    }

    /// Creates a missing-length error.
    pub fn missing_length(locator: impl Into<String>) -> Self {
        Self::MissingLengthMetadata {
            locator: locator.into(),
        }
    }

    /// Creates an empty-resource error.
    pub fn empty_resource(locator: impl Into<String>) -> Self {
        Self::EmptyResource {
            locator: locator.into(),
        }
    }

    /// Creates a mid-stream read error.
    pub fn stream_read(locator: impl Into<String>, received: u64, cause: StreamFault) -> Self {
        Self::StreamRead {
            locator: locator.into(),
            received,
            cause,
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::MissingLengthMetadata { .. } => ErrorKind::MissingLengthMetadata,
            Self::EmptyResource { .. } => ErrorKind::EmptyResource,
            Self::StreamRead { .. } => ErrorKind::StreamRead,
            Self::Sink(_) => ErrorKind::Sink,
        }
    }

    /// Returns `true` for "could not save" as opposed to "could not fetch".
    #[must_use]
    pub fn is_save_failure(&self) -> bool {
        matches!(self, Self::Sink(_))
    }

    /// Returns the HTTP status code for transport errors that have one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Received and declared byte counts disagreed at end-of-data.
///
/// Recorded on a completed session; it never blocks completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatchWarning {
    /// Length declared by the source.
    pub declared: u64,
    /// Bytes actually received.
    pub received: u64,
}

impl LengthMismatchWarning {
    /// Returns a warning when the counts differ.
    #[must_use]
    pub fn check(declared: u64, received: u64) -> Option<Self> {
        (declared != received).then_some(Self { declared, received })
    }
}

impl fmt::Display for LengthMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source declared {} bytes but sent {}",
            self.declared, self.received
        )
    }
}
