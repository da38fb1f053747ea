//! Error types for content describers.

use thiserror::Error;

/// Failures inside a describer.
///
/// These never reach callers of
/// [`DescriptionService::describe`](super::DescriptionService::describe);
/// they are logged and replaced by the fallback record.
#[derive(Debug, Error)]
pub enum DescribeError {
    /// The describer endpoint could not be reached or timed out.
    #[error("network error describing {locator}: {source}")]
    Network {
        /// Locator being described.
        locator: String,
        /// The underlying request error.
        #[source]
        source: reqwest::Error,
    },

    /// The describer endpoint answered with a non-success status.
    #[error("describer returned HTTP {status} for {locator}")]
    HttpStatus {
        /// Locator being described.
        locator: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not a usable description.
    #[error("invalid description for {locator}: {reason}")]
    InvalidResponse {
        /// Locator being described.
        locator: String,
        /// What was wrong with the body.
        reason: String,
    },
}

impl DescribeError {
    /// Creates a network error.
    pub fn network(locator: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            locator: locator.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(locator: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            locator: locator.into(),
            status,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}
