//! Result-list navigation: issuing the search and walking the
//! infinitely-scrolling results feed.
//!
//! Google Maps renders search results into a `div[role="feed"]` panel that
//! loads more entries as it is scrolled. [`ListingStream`] models that as an
//! explicit pull-based iterator: each `next()` serves a buffered handle or
//! scrolls for more, and terminates on one of three conditions — the
//! requested limit was reached, the feed stopped producing new entries
//! (soft exhaustion, not an error), or a navigation failure.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use mapscout_core::AppConfig;

use crate::dom::DomReader;
use crate::error::ScraperError;
use crate::pacing::Pacer;

const SEARCH_URL_BASE: &str = "https://www.google.com/maps/search/";

/// The scrollable results panel.
pub(crate) const RESULTS_FEED: &str = "div[role='feed']";

/// Anchor of every rendered result entry; its href is the place URL.
const LISTING_LINKS: &str = "a[href*='/maps/place/']";

/// Scroll step large enough to force the feed to fetch the next batch.
const SCROLL_STEP_PX: f64 = 5000.0;

/// Hard cap on scroll rounds so a cycling feed cannot loop forever.
const MAX_SCROLL_ROUNDS: u32 = 200;

/// Characters escaped in the search term. Spaces are left for the
/// `+`-substitution pass below, matching how browsers encode form queries.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b' ');

/// Opaque reference to one rendered result-list entry.
///
/// The place URL is the stable identity of an entry: feed nodes detach and
/// re-render as the panel virtualizes, but the URL survives, and the detail
/// view is opened by navigating to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingHandle {
    /// 0-based position in DOM order across the whole session.
    pub position: usize,
    /// The listing's Google Maps place URL.
    pub url: String,
}

/// Builds the search URL for `"{query} in {location}"`.
fn search_url(query: &str, location: &str) -> String {
    let term = format!("{query} in {location}");
    let encoded = utf8_percent_encode(&term, QUERY_SET)
        .to_string()
        .replace(' ', "+");
    format!("{SEARCH_URL_BASE}{encoded}")
}

/// Drives the results page of one search session.
pub struct Navigator<'a, D: DomReader> {
    dom: &'a D,
    pacer: &'a Pacer,
    results_timeout: Duration,
    stall_threshold: u32,
    max_attempts: u32,
}

impl<'a, D: DomReader> Navigator<'a, D> {
    #[must_use]
    pub fn new(dom: &'a D, pacer: &'a Pacer, config: &AppConfig) -> Self {
        Self {
            dom,
            pacer,
            results_timeout: config.results_timeout(),
            stall_threshold: config.scroll_stall_threshold,
            max_attempts: config.max_attempts,
        }
    }

    /// Issues the search and waits for the results panel to render.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Navigation`] when the page cannot be opened or the
    /// results panel never renders within the timeout window.
    pub async fn search(&self, query: &str, location: &str) -> Result<(), ScraperError> {
        let url = search_url(query, location);
        tracing::info!(query, location, "opening results page");

        self.dom.goto(&url).await.map_err(|e| ScraperError::Navigation {
            stage: "opening the search results page".to_owned(),
            source: e,
        })?;

        self.dom
            .wait_for_selector(RESULTS_FEED, self.results_timeout)
            .await
            .map_err(|e| ScraperError::Navigation {
                stage: "waiting for the results panel".to_owned(),
                source: e,
            })?;

        Ok(())
    }

    /// Returns a stream over listing handles, bounded by `limit`.
    ///
    /// Restartable only by re-invoking [`Navigator::search`].
    #[must_use]
    pub fn listings(&self, limit: usize) -> ListingStream<'a, D> {
        ListingStream {
            dom: self.dom,
            pacer: self.pacer,
            limit,
            stall_threshold: self.stall_threshold,
            max_attempts: self.max_attempts,
            seen: HashSet::new(),
            pending: VecDeque::new(),
            yielded: 0,
            stalls: 0,
            rounds: 0,
            nav_failures: 0,
            exhausted: false,
        }
    }
}

/// Pull-based iterator over the results feed.
///
/// Scrolls the feed between pulls and diffs the rendered entries against
/// everything already seen, yielding new ones in DOM order (the feed's own
/// order is authoritative; no re-sorting).
pub struct ListingStream<'a, D: DomReader> {
    dom: &'a D,
    pacer: &'a Pacer,
    limit: usize,
    stall_threshold: u32,
    max_attempts: u32,
    seen: HashSet<String>,
    pending: VecDeque<ListingHandle>,
    yielded: usize,
    stalls: u32,
    rounds: u32,
    nav_failures: u32,
    exhausted: bool,
}

impl<D: DomReader> ListingStream<'_, D> {
    /// Yields the next listing handle, or `None` once the limit is reached
    /// or the list is exhausted.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Navigation`] when scrolling or querying the feed
    /// fails.
    pub async fn next(&mut self) -> Result<Option<ListingHandle>, ScraperError> {
        loop {
            if self.yielded >= self.limit {
                return Ok(None);
            }
            if let Some(handle) = self.pending.pop_front() {
                self.yielded += 1;
                return Ok(Some(handle));
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.load_more().await {
                Ok(()) => self.nav_failures = 0,
                Err(err) if err.is_transient() && self.nav_failures + 1 < self.max_attempts => {
                    self.nav_failures += 1;
                    tracing::warn!(
                        attempt = self.nav_failures,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "transient feed error — retrying scroll"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Whether the feed ran out of listings before the limit was reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Handles yielded so far.
    #[must_use]
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// One scroll round: scroll the feed, settle, diff the rendered entries.
    async fn load_more(&mut self) -> Result<(), ScraperError> {
        self.rounds += 1;
        if self.rounds > MAX_SCROLL_ROUNDS {
            tracing::warn!(rounds = self.rounds, "scroll round cap reached — treating as exhausted");
            self.exhausted = true;
            return Ok(());
        }

        self.dom
            .scroll_by(RESULTS_FEED, SCROLL_STEP_PX)
            .await
            .map_err(|e| ScraperError::Navigation {
                stage: "scrolling the results feed".to_owned(),
                source: e,
            })?;
        self.pacer.pause().await;

        let urls = self
            .dom
            .query_selector_all(LISTING_LINKS, "href")
            .await
            .map_err(|e| ScraperError::Navigation {
                stage: "reading the results feed".to_owned(),
                source: e,
            })?;

        let mut fresh = 0usize;
        for url in urls {
            if self.seen.insert(url.clone()) {
                let position = self.seen.len() - 1;
                self.pending.push_back(ListingHandle { position, url });
                fresh += 1;
            }
        }

        if fresh == 0 {
            self.stalls += 1;
            if self.stalls >= self.stall_threshold {
                self.exhausted = true;
                tracing::info!(
                    stalls = self.stalls,
                    listings = self.seen.len(),
                    "no new listings after consecutive scrolls — list exhausted"
                );
            }
        } else {
            self.stalls = 0;
            tracing::debug!(fresh, total = self.seen.len(), "feed rendered new listings");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
