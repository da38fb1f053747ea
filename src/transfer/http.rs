//! reqwest-backed [`TransferSource`].

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument};
use url::Url;

use super::error::{StreamFault, TransferError};
use super::source::{SourceResponse, TransferSource};
use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle time allowed between two reads (5 minutes).
///
/// This bounds a stalled connection, not the length of a transfer; an overall
/// limit is a [`CancelSignal`](super::CancelSignal) deadline.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// HTTP transfer source.
///
/// Create once and reuse across sessions to share the connection pool.
/// Response decompression stays off so the declared `Content-Length` counts
/// the same bytes the session reads.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Creates a source with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a source with explicit timeout values in seconds.
    ///
    /// `read_timeout_secs` applies to each read separately and resets whenever
    /// data arrives.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_transfer_user_agent())
            .build()?;
        Ok(Self { client })
    }

}

#[async_trait]
impl TransferSource for HttpSource {
    #[instrument(level = "debug", skip(self))]
    async fn open(&self, locator: &str) -> Result<SourceResponse, TransferError> {
        let url = parse_http_url(locator)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransferError::connect(locator, "timed out waiting for response headers")
            } else {
                TransferError::connect(locator, e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_length = declared_content_length(&response);
        debug!(status, ?content_length, "response headers received");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Box::new(e) as StreamFault))
            .boxed();

        Ok(SourceResponse {
            status,
            content_length,
            body: Some(body),
        })
    }
}

fn parse_http_url(locator: &str) -> Result<Url, TransferError> {
    let url = Url::parse(locator)
        .map_err(|e| TransferError::connect(locator, format!("invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransferError::connect(
            locator,
            format!("unsupported URL scheme `{other}`"),
        )),
    }
}

/// Reads `Content-Length` straight from the headers.
fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
