pub mod browser;
pub mod dom;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod pacing;
mod parse;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::StealthSession;
pub use dom::{DomError, DomReader};
pub use error::ScraperError;
pub use extract::Extractor;
pub use navigator::{ListingHandle, ListingStream, Navigator};
pub use pacing::{with_retry, AttemptOutcome, Pacer, StopToken};
pub use session::{scrape, ScrapeOutcome, ScrapeSummary, SearchRequest};
pub use sink::ResultSink;
