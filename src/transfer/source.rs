//! The transfer-source seam: anything that answers a locator with a status,
//! a declared length and a chunk stream.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use super::error::{StreamFault, TransferError};

/// Sequential chunk reads; `None` is end-of-data.
pub type ChunkStream = BoxStream<'static, Result<Bytes, StreamFault>>;

/// Response headers and body handle produced by opening a source.
pub struct SourceResponse {
    /// Status code reported by the source.
    pub status: u16,
    /// Exact body length in bytes, if the source declared one.
    pub content_length: Option<u64>,
    /// Body reader; `None` when the response carries no readable body.
    pub body: Option<ChunkStream>,
}

impl SourceResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Opens a remote resource for one transfer attempt.
///
/// Implementations report what the remote side said; validating the status
/// and the declared length is the session's job. An `Err` is reserved for
/// failures that produced no response at all (bad locator, refused
/// connection, timeout before headers).
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Issues the request for `locator` and returns once headers are in.
    async fn open(&self, locator: &str) -> Result<SourceResponse, TransferError>;
}
