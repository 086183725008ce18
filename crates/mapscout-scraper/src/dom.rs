//! The capability boundary between the engine and the browser.
//!
//! The engine never touches chromiumoxide directly: everything it needs
//! from a page — navigate, wait, read, scroll, click — goes through
//! [`DomReader`]. Production uses [`crate::browser::ChromiumDom`]; tests
//! drive the same seam with a scripted mock.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("timed out after {waited_ms}ms waiting for \"{target}\"")]
    Timeout { target: String, waited_ms: u64 },

    #[error("no element matches \"{selector}\"")]
    NotFound { selector: String },

    #[error("element for \"{selector}\" is detached from the document")]
    Detached { selector: String },

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl DomError {
    /// Timeouts and detached nodes are the two failure modes that routinely
    /// clear up on their own while the page keeps loading or re-renders.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Detached { .. })
    }
}

/// Read/interact surface over one browser page.
///
/// Implementations are not expected to be safe for concurrent page actions;
/// callers serialize access (one logical task drives a session end-to-end).
#[async_trait]
pub trait DomReader: Send + Sync {
    /// Navigates the page to `url` and waits for the load to settle.
    async fn goto(&self, url: &str) -> Result<(), DomError>;

    /// Polls until `selector` matches an element, up to `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DomError>;

    /// Returns `attribute` of every element matching `selector`, in DOM
    /// order. Elements without the attribute are skipped.
    async fn query_selector_all(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, DomError>;

    /// Inner text of the first element matching `selector`, or `None` when
    /// nothing matches.
    async fn text_of(&self, selector: &str) -> Result<Option<String>, DomError>;

    /// `attribute` of the first element matching `selector`, or `None` when
    /// nothing matches or the attribute is unset.
    async fn attribute_of(&self, selector: &str, attribute: &str)
        -> Result<Option<String>, DomError>;

    /// Scrolls the first element matching `container` down by `delta_y`
    /// pixels.
    async fn scroll_by(&self, container: &str, delta_y: f64) -> Result<(), DomError>;

    /// Clicks the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), DomError>;

    /// The page's current URL, when the browser can report one.
    async fn current_url(&self) -> Result<Option<String>, DomError>;
}
