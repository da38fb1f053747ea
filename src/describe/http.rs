//! JSON-over-HTTP describer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{ContentDescriber, DescribeError, Description};
use crate::user_agent;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct DescribeRequest<'a> {
    url: &'a str,
}

/// Describer that POSTs `{"url": locator}` to an endpoint and expects
/// `{"title": ..., "summary": ...}` back.
#[derive(Debug, Clone)]
pub struct HttpDescriber {
    client: Client,
    endpoint: String,
}

impl HttpDescriber {
    /// Creates a describer for `endpoint` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(user_agent::default_describe_user_agent())
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ContentDescriber for HttpDescriber {
    #[instrument(level = "debug", skip(self), fields(endpoint = %self.endpoint))]
    async fn describe(&self, locator: &str) -> Result<Description, DescribeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DescribeRequest { url: locator })
            .send()
            .await
            .map_err(|e| DescribeError::network(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DescribeError::http_status(locator, status.as_u16()));
        }

        let description: Description = response
            .json()
            .await
            .map_err(|e| DescribeError::invalid_response(locator, e.to_string()))?;

        if description.title.trim().is_empty() {
            return Err(DescribeError::invalid_response(locator, "empty title"));
        }

        debug!(title = %description.title, "description received");
        Ok(description)
    }
}
