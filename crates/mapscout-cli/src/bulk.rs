//! The `bulk` subcommand: a file of `query|location` lines, one isolated
//! session per line.
//!
//! Sessions share nothing but the read-only config — each gets its own
//! browser and sink — so they can run in parallel, bounded by
//! `MAX_CONCURRENT_SESSIONS`.

use std::path::Path;

use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, Table};
use futures::stream::{self, StreamExt};

use mapscout_core::AppConfig;
use mapscout_scraper::{ScrapeOutcome, ScraperError, SearchRequest, StopToken};

use crate::export::ExportFormat;
use crate::scrape;

/// Parses `query|location` lines; blank lines and lines without a `|` are
/// skipped.
pub fn parse_queries(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (query, location) = line.split_once('|')?;
            let (query, location) = (query.trim(), location.trim());
            if query.is_empty() || location.is_empty() {
                return None;
            }
            Some((query.to_owned(), location.to_owned()))
        })
        .collect()
}

pub async fn run(
    config: &AppConfig,
    queries_file: &Path,
    limit: Option<usize>,
    output: ExportFormat,
    stop: &StopToken,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(queries_file)
        .with_context(|| format!("reading queries file {}", queries_file.display()))?;
    let queries = parse_queries(&contents);
    anyhow::ensure!(
        !queries.is_empty(),
        "no valid \"query|location\" lines in {}",
        queries_file.display()
    );

    let limit = limit.unwrap_or(config.default_limit);
    println!("Running {} queries (limit {limit} each) ...", queries.len());

    let max_concurrent = config.max_concurrent_sessions.max(1);
    let outcomes: Vec<(SearchRequest, Result<ScrapeOutcome, ScraperError>)> =
        stream::iter(queries)
            .map(|(query, location)| async move {
                let request = SearchRequest::new(query, location, limit);
                let outcome = mapscout_scraper::scrape(config, &request, stop).await;
                (request, outcome)
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut summary = Table::new();
    summary
        .load_preset(UTF8_FULL)
        .set_header(["Query", "Location", "Results", "Status"]);
    let mut total_records = 0usize;
    let mut launch_failure = None;

    for (request, outcome) in &outcomes {
        match outcome {
            Ok(outcome) => {
                println!("\n=== {} in {} ===", request.query, request.location);
                scrape::report(config, request, outcome, output)?;
                total_records += outcome.records.len();
                let status = if outcome.records.is_empty() {
                    "no data"
                } else if outcome.summary.interrupted {
                    "partial"
                } else {
                    "ok"
                };
                let count = outcome.records.len().to_string();
                summary.add_row([
                    request.query.as_str(),
                    request.location.as_str(),
                    count.as_str(),
                    status,
                ]);
            }
            Err(e) => {
                tracing::error!(query = %request.query, error = %e, "session failed to launch");
                summary.add_row([
                    request.query.as_str(),
                    request.location.as_str(),
                    "0",
                    "failed",
                ]);
                launch_failure = Some(format!("{e}"));
            }
        }
    }

    println!("\n{summary}");
    println!("Total businesses scraped: {total_records}");

    // A launch failure is fatal for the run even when other sessions
    // completed; their exports are already on disk.
    if let Some(reason) = launch_failure {
        anyhow::bail!("at least one session failed fatally: {reason}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_lines() {
        let contents = "restaurants|Istanbul\ncoffee shops|Ankara\n";
        assert_eq!(
            parse_queries(contents),
            vec![
                ("restaurants".to_owned(), "Istanbul".to_owned()),
                ("coffee shops".to_owned(), "Ankara".to_owned()),
            ]
        );
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let contents = "\nrestaurants|Istanbul\njust-a-query\n|no-query\nempty-location|\n";
        assert_eq!(
            parse_queries(contents),
            vec![("restaurants".to_owned(), "Istanbul".to_owned())]
        );
    }

    #[test]
    fn trims_whitespace_around_fields() {
        let contents = "  hotels  |  Izmir  \n";
        assert_eq!(
            parse_queries(contents),
            vec![("hotels".to_owned(), "Izmir".to_owned())]
        );
    }

    #[test]
    fn keeps_extra_pipes_in_location() {
        // split_once: everything after the first pipe is the location.
        let contents = "bars|St. Louis|MO\n";
        assert_eq!(
            parse_queries(contents),
            vec![("bars".to_owned(), "St. Louis|MO".to_owned())]
        );
    }
}
