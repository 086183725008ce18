//! End-to-end orchestration of one search session.
//!
//! A session is driven by a single logical task: search, pull listing
//! handles, pace and retry each extraction, feed the sink. Two pages share
//! the browser — the results feed keeps its scroll state while detail
//! views load in the second page (the original sidebar stays untouched
//! between pulls). Independent sessions in bulk mode are fully isolated:
//! each gets its own browser and sink, sharing only the read-only config.

use mapscout_core::{AppConfig, BusinessRecord};

use crate::browser::{ChromiumDom, StealthSession};
use crate::dom::DomReader;
use crate::error::ScraperError;
use crate::extract::Extractor;
use crate::navigator::Navigator;
use crate::pacing::{with_retry, Pacer, StopToken};
use crate::sink::ResultSink;

/// One search to run: what, where, and how many.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    pub limit: usize,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, location: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            limit,
        }
    }
}

/// Counters describing how a session went, for the end-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// The requested result limit.
    pub requested: usize,
    /// Listings an extraction was attempted for.
    pub attempted: usize,
    /// Extractions that produced a record (before deduplication).
    pub succeeded: usize,
    /// Records dropped as duplicates by the sink.
    pub duplicates: usize,
    /// The feed ran out of listings before the limit was reached.
    pub exhausted: bool,
    /// The session ended early — stop signal, or a navigation failure that
    /// outlived its retry budget. Collected records are kept either way.
    pub interrupted: bool,
}

/// Final result of a session: records in first-seen order plus counters.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub records: Vec<BusinessRecord>,
    pub summary: ScrapeSummary,
}

/// Runs one full scraping session: launch, search, extract, teardown.
///
/// The browser is closed on every exit path. Soft exhaustion, stop
/// requests, and mid-session navigation failures all produce an `Ok`
/// outcome carrying whatever was collected; the summary says what ended
/// the session.
///
/// # Errors
///
/// [`ScraperError::Launch`] when the browser cannot be started or a page
/// cannot be prepared. Nothing else is fatal to the call.
pub async fn scrape(
    config: &AppConfig,
    request: &SearchRequest,
    stop: &StopToken,
) -> Result<ScrapeOutcome, ScraperError> {
    let session = StealthSession::launch(config).await?;

    let outcome = match open_pages(&session).await {
        Ok((results_page, detail_page)) => {
            Ok(run_session(&results_page, &detail_page, config, request, stop).await)
        }
        Err(e) => Err(e),
    };

    session.close().await;
    outcome
}

async fn open_pages(
    session: &StealthSession,
) -> Result<(ChromiumDom, ChromiumDom), ScraperError> {
    let results_page = session.new_page().await?;
    let detail_page = session.new_page().await?;
    Ok((results_page, detail_page))
}

/// The session drive loop, generic over the DOM capability so tests can run
/// it against a scripted mock.
pub(crate) async fn run_session<D: DomReader>(
    results: &D,
    details: &D,
    config: &AppConfig,
    request: &SearchRequest,
    stop: &StopToken,
) -> ScrapeOutcome {
    let pacer = Pacer::new(config.min_delay_secs, config.max_delay_secs);
    let navigator = Navigator::new(results, &pacer, config);
    let extractor = Extractor::new(details, config);
    let mut sink = ResultSink::new();
    let mut summary = ScrapeSummary {
        requested: request.limit,
        ..ScrapeSummary::default()
    };

    if stop.is_stopped() {
        summary.interrupted = true;
        return ScrapeOutcome {
            records: sink.into_records(),
            summary,
        };
    }

    let searched = with_retry(&pacer, config.max_attempts, stop, || {
        navigator.search(&request.query, &request.location)
    })
    .await;
    if let Err(e) = searched {
        tracing::error!(error = %e, "search never rendered a results panel");
        summary.interrupted = true;
        return ScrapeOutcome {
            records: sink.into_records(),
            summary,
        };
    }

    let mut stream = navigator.listings(request.limit);

    loop {
        if stop.is_stopped() {
            tracing::info!("stop requested — winding down session");
            summary.interrupted = true;
            break;
        }

        let handle = match stream.next().await {
            Ok(Some(handle)) => handle,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "results feed failed — keeping partial results");
                summary.interrupted = true;
                break;
            }
        };

        summary.attempted += 1;
        let extracted = with_retry(&pacer, config.max_attempts, stop, || {
            extractor.extract(&handle)
        })
        .await;

        match extracted {
            Ok(record) => {
                summary.succeeded += 1;
                tracing::info!(
                    name = %record.name,
                    collected = sink.len(),
                    "extracted listing"
                );
                if !sink.add(record) {
                    summary.duplicates += 1;
                }
            }
            // Terminal for this listing only; the session moves on.
            Err(e) => {
                tracing::warn!(url = %handle.url, error = %e, "listing failed after retries — skipping");
            }
        }
    }

    summary.exhausted = stream.is_exhausted();
    tracing::info!(
        collected = sink.len(),
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        exhausted = summary.exhausted,
        "session finished"
    );

    ScrapeOutcome {
        records: sink.into_records(),
        summary,
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
