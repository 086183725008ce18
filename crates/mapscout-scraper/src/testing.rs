//! Scripted [`DomReader`] for engine tests.
//!
//! `MockDom` plays both roles a session needs: the results feed (batches of
//! listing URLs released one per scroll) and the detail pages (per-URL
//! selector fixtures). Failure injection covers the transient cases the
//! retry controller must handle.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use mapscout_core::AppConfig;

use crate::dom::{DomError, DomReader};
use crate::extract;
use crate::navigator::RESULTS_FEED;

/// Config with instant pacing and small timeouts, for fast engine tests.
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        output_dir: std::path::PathBuf::from("data/results"),
        default_limit: 50,
        min_delay_secs: 0.0,
        max_delay_secs: 0.0,
        headless: true,
        block_images: true,
        max_attempts: 3,
        scroll_stall_threshold: 3,
        results_timeout_secs: 1,
        detail_timeout_secs: 1,
        max_concurrent_sessions: 1,
    }
}

/// Selector → text and (selector, attribute) → value fixture for one
/// listing's detail view.
#[derive(Debug, Clone, Default)]
pub(crate) struct DetailFixture {
    texts: HashMap<String, String>,
    attrs: HashMap<(String, String), String>,
}

impl DetailFixture {
    /// A detail view whose header renders `name` (under both the current
    /// class and the bare `h1` fallback, as on the live page).
    pub(crate) fn named(name: &str) -> Self {
        Self::default()
            .text(extract::NAME_SELECTORS[0], name)
            .text("h1", name)
    }

    pub(crate) fn text(mut self, selector: &str, value: &str) -> Self {
        self.texts.insert(selector.to_owned(), value.to_owned());
        self
    }

    pub(crate) fn attr(mut self, selector: &str, attribute: &str, value: &str) -> Self {
        self.attrs
            .insert((selector.to_owned(), attribute.to_owned()), value.to_owned());
        self
    }

    pub(crate) fn rating(self, value: &str) -> Self {
        self.text(extract::RATING_SELECTORS[0], value)
    }

    pub(crate) fn reviews(self, value: &str) -> Self {
        self.text(extract::REVIEW_COUNT_SELECTORS[0], value)
    }

    pub(crate) fn category(self, value: &str) -> Self {
        self.text(extract::CATEGORY_SELECTORS[0], value)
    }

    pub(crate) fn address(self, value: &str) -> Self {
        self.text(extract::ADDRESS_SELECTORS[0], value)
    }

    pub(crate) fn phone(self, value: &str) -> Self {
        self.text(extract::PHONE_SELECTORS[0], value)
    }

    pub(crate) fn website(self, value: &str) -> Self {
        let (selector, attribute) = extract::WEBSITE_SELECTORS[0];
        self.attr(selector, attribute, value)
    }
}

#[derive(Debug, Default)]
struct MockState {
    current_url: Option<String>,
    feed_available: bool,
    rendered: Vec<String>,
    feed_batches: VecDeque<Vec<String>>,
    details: HashMap<String, DetailFixture>,
    goto_failures: HashMap<String, u32>,
    scroll_failures: u32,
    scrolls: u32,
}

/// Scripted in-memory stand-in for a browser page.
#[derive(Debug, Default)]
pub(crate) struct MockDom {
    state: Mutex<MockState>,
}

impl MockDom {
    pub(crate) fn new() -> Self {
        let dom = Self::default();
        dom.state.lock().unwrap().feed_available = true;
        dom
    }

    /// Scripts the feed: each scroll releases the next batch of listing
    /// URLs into the rendered set. An exhausted script means further
    /// scrolls render nothing new.
    pub(crate) fn with_feed_batches(self, batches: Vec<Vec<&str>>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.feed_batches = batches
                .into_iter()
                .map(|batch| batch.into_iter().map(str::to_owned).collect())
                .collect();
        }
        self
    }

    pub(crate) fn with_detail(self, url: &str, fixture: DetailFixture) -> Self {
        self.state
            .lock()
            .unwrap()
            .details
            .insert(url.to_owned(), fixture);
        self
    }

    /// The next `failures` navigations to `url` fail with a timeout.
    pub(crate) fn with_goto_failures(self, url: &str, failures: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .goto_failures
            .insert(url.to_owned(), failures);
        self
    }

    /// The next `failures` feed scrolls fail with a timeout.
    pub(crate) fn with_scroll_failures(self, failures: u32) -> Self {
        self.state.lock().unwrap().scroll_failures = failures;
        self
    }

    /// The results panel never renders.
    pub(crate) fn without_feed(self) -> Self {
        self.state.lock().unwrap().feed_available = false;
        self
    }

    pub(crate) fn scroll_count(&self) -> u32 {
        self.state.lock().unwrap().scrolls
    }
}

#[async_trait]
impl DomReader for MockDom {
    async fn goto(&self, url: &str) -> Result<(), DomError> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.goto_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DomError::Timeout {
                    target: url.to_owned(),
                    waited_ms: 10,
                });
            }
        }
        state.current_url = Some(url.to_owned());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DomError> {
        let state = self.state.lock().unwrap();
        if selector == RESULTS_FEED {
            if state.feed_available {
                return Ok(());
            }
        } else if let Some(url) = state.current_url.as_ref() {
            if let Some(fixture) = state.details.get(url) {
                if fixture.texts.contains_key(selector) {
                    return Ok(());
                }
            }
        }
        Err(DomError::Timeout {
            target: selector.to_owned(),
            waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn query_selector_all(
        &self,
        _selector: &str,
        _attribute: &str,
    ) -> Result<Vec<String>, DomError> {
        Ok(self.state.lock().unwrap().rendered.clone())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, DomError> {
        let state = self.state.lock().unwrap();
        let fixture = state
            .current_url
            .as_ref()
            .and_then(|url| state.details.get(url));
        Ok(fixture.and_then(|f| f.texts.get(selector).cloned()))
    }

    async fn attribute_of(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, DomError> {
        let state = self.state.lock().unwrap();
        let fixture = state
            .current_url
            .as_ref()
            .and_then(|url| state.details.get(url));
        Ok(fixture.and_then(|f| {
            f.attrs
                .get(&(selector.to_owned(), attribute.to_owned()))
                .cloned()
        }))
    }

    async fn scroll_by(&self, container: &str, _delta_y: f64) -> Result<(), DomError> {
        let mut state = self.state.lock().unwrap();
        if state.scroll_failures > 0 {
            state.scroll_failures -= 1;
            return Err(DomError::Timeout {
                target: container.to_owned(),
                waited_ms: 10,
            });
        }
        state.scrolls += 1;
        if let Some(batch) = state.feed_batches.pop_front() {
            state.rendered.extend(batch);
        }
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<(), DomError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>, DomError> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }
}
