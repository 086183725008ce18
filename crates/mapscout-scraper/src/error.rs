use thiserror::Error;

use crate::dom::DomError;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser launch failed: {reason}")]
    Launch { reason: String },

    #[error("navigation failed while {stage}: {source}")]
    Navigation {
        stage: String,
        #[source]
        source: DomError,
    },

    #[error("extraction failed for {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: DomError,
    },
}

impl ScraperError {
    /// Returns `true` if this error represents a transient condition worth
    /// retrying after a pacing delay.
    ///
    /// Retriable:
    /// - [`ScraperError::Navigation`] / [`ScraperError::Extraction`] caused by
    ///   a wait timeout or a detached node — both resolve on their own often
    ///   enough that a bounded retry is worthwhile.
    ///
    /// Not retriable (propagated immediately):
    /// - [`ScraperError::Launch`] — the browser binary never started;
    ///   retrying without operator action fails the same way.
    /// - Missing-node and protocol errors — the page rendered without the
    ///   element; asking again returns the same answer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Launch { .. } => false,
            Self::Navigation { source, .. } | Self::Extraction { source, .. } => {
                source.is_transient()
            }
        }
    }
}
