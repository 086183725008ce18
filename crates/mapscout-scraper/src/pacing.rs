//! Pacing and bounded retry for session actions.
//!
//! Every action against the shared browser session goes through a
//! randomized delay drawn from the configured window, mimicking a human
//! reading the page between interactions. [`with_retry`] wraps an action
//! with that pacing plus a bounded retry loop for transient failures
//! (wait timeouts, detached nodes). Non-transient errors are returned
//! immediately without retrying.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScraperError;

/// Draws a uniform random delay from `[min, max]` before each action.
#[derive(Debug, Clone)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Builds a pacer from a delay window in seconds.
    ///
    /// The window is validated at configuration load (`MIN_DELAY <=
    /// MAX_DELAY`, both finite and non-negative); this constructor trusts it.
    #[must_use]
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self {
            min: Duration::from_secs_f64(min_secs),
            max: Duration::from_secs_f64(max_secs),
        }
    }

    /// Picks one delay, uniformly distributed across the window.
    #[must_use]
    pub fn pick(&self) -> Duration {
        let spread = self.max.saturating_sub(self.min);
        self.min + spread.mul_f64(rand::random::<f64>())
    }

    /// Sleeps for one picked delay.
    pub async fn pause(&self) {
        tokio::time::sleep(self.pick()).await;
    }

    /// Sleeps one picked delay, then runs `action` and returns its result.
    pub async fn with_pacing<T, F, Fut>(&self, action: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.pause().await;
        action().await
    }
}

/// Cooperative stop signal shared between the CLI and running sessions.
///
/// Checked at retry boundaries and between listings — never mid-extraction —
/// so partial results already collected stay intact.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that sessions wind down at their next check point.
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Outcome of one extraction/navigation attempt — the per-listing state
/// machine made inspectable: `Pending → Extracting → {Succeeded, Retrying →
/// Extracting, Failed}` maps to `Success`, `Transient` (another attempt
/// remains), and `Terminal`.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    Transient(ScraperError),
    Terminal(ScraperError),
}

/// Classifies one attempt result by the transience of its error.
pub(crate) fn classify<T>(result: Result<T, ScraperError>) -> AttemptOutcome<T> {
    match result {
        Ok(value) => AttemptOutcome::Success(value),
        Err(err) if err.is_transient() => AttemptOutcome::Transient(err),
        Err(err) => AttemptOutcome::Terminal(err),
    }
}

/// Runs `operation` with pacing before every attempt and up to
/// `max_attempts` total attempts on transient errors.
///
/// On success the result is returned immediately. Transient failures are
/// retried until the attempt budget is spent, then the last error is
/// returned. Terminal errors are returned without further attempts, and a
/// triggered `stop` abandons the loop at the next retry boundary.
///
/// # Attempt schedule (example with `max_attempts = 3`)
///
/// | Attempt | Preceded by | On transient failure |
/// |---------|-------------|----------------------|
/// | 1       | pacing delay | retry |
/// | 2       | pacing delay | retry |
/// | 3       | pacing delay | return the error |
///
/// # Errors
///
/// The last transient error once attempts are exhausted, the first terminal
/// error encountered, or the pending transient error when `stop` fires.
pub async fn with_retry<T, F, Fut>(
    pacer: &Pacer,
    max_attempts: u32,
    stop: &StopToken,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 1u32;

    loop {
        pacer.pause().await;

        match classify(operation().await) {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Terminal(err) => return Err(err),
            AttemptOutcome::Transient(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                if stop.is_stopped() {
                    tracing::debug!("stop requested — abandoning retry loop");
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "transient scrape error — retrying"
                );
                attempt += 1;
            }
        }
    }
}
