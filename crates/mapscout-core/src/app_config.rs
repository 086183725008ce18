use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration, built once at startup and read-only after.
///
/// Sessions receive a shared reference; there is no mutable global state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory export files are written to. Created on demand.
    pub output_dir: PathBuf,
    /// Result limit used when the CLI does not pass `--limit`.
    pub default_limit: usize,
    /// Lower bound of the randomized inter-action delay, in seconds.
    pub min_delay_secs: f64,
    /// Upper bound of the randomized inter-action delay, in seconds.
    pub max_delay_secs: f64,
    /// Run Chrome without a visible window.
    pub headless: bool,
    /// Block image/font/tile requests for faster page loads.
    pub block_images: bool,
    /// Total attempts per listing before it is marked failed.
    pub max_attempts: u32,
    /// Consecutive no-new-listings scrolls treated as list exhaustion.
    pub scroll_stall_threshold: u32,
    /// How long to wait for the results panel to render.
    pub results_timeout_secs: u64,
    /// How long to wait for a listing's detail view to render.
    pub detail_timeout_secs: u64,
    /// Independent browser sessions run at once in bulk mode.
    pub max_concurrent_sessions: usize,
}

impl AppConfig {
    #[must_use]
    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.results_timeout_secs)
    }

    #[must_use]
    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }
}
