//! Title and summary lookup for a resource.
//!
//! The transfer never depends on this: a [`DescriptionService`] always
//! resolves, substituting [`Description::fallback`] when its describer is
//! missing or fails. The title usually becomes the artifact's display name.

mod error;
mod http;

pub use error::DescribeError;
pub use http::HttpDescriber;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Title used when no description could be produced.
pub const FALLBACK_TITLE: &str = "AI Could Not Determine Title";

/// Summary used when no description could be produced.
pub const FALLBACK_SUMMARY: &str =
    "There was an issue generating the video summary. Please check the URL or try again later.";

/// Human-readable title and summary of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Short title.
    pub title: String,
    /// One-paragraph summary.
    pub summary: String,
}

impl Description {
    /// The fixed record returned whenever describing fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            summary: FALLBACK_SUMMARY.to_string(),
        }
    }

    /// Returns `true` if this is the fallback record.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.title == FALLBACK_TITLE && self.summary == FALLBACK_SUMMARY
    }
}

/// Something that can describe a locator, and may fail doing so.
#[async_trait]
pub trait ContentDescriber: Send + Sync {
    /// Produces a description for `locator`.
    async fn describe(&self, locator: &str) -> Result<Description, DescribeError>;
}

/// Never-failing front for an optional [`ContentDescriber`].
#[derive(Default)]
pub struct DescriptionService {
    describer: Option<Box<dyn ContentDescriber>>,
}

impl std::fmt::Debug for DescriptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionService")
            .field("has_describer", &self.describer.is_some())
            .finish()
    }
}

impl DescriptionService {
    /// Creates a service backed by `describer`.
    #[must_use]
    pub fn new(describer: Box<dyn ContentDescriber>) -> Self {
        Self {
            describer: Some(describer),
        }
    }

    /// Creates a service that always answers with the fallback record.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Describes `locator`; any failure yields [`Description::fallback`].
    #[instrument(level = "debug", skip(self))]
    pub async fn describe(&self, locator: &str) -> Description {
        let Some(describer) = &self.describer else {
            debug!("no describer configured; using fallback description");
            return Description::fallback();
        };
        match describer.describe(locator).await {
            Ok(description) => description,
            Err(error) => {
                warn!(error = %error, "describing failed; using fallback description");
                Description::fallback()
            }
        }
    }
}
