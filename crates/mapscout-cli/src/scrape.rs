//! The `scrape` subcommand: one query, one session.

use mapscout_core::AppConfig;
use mapscout_scraper::{ScrapeOutcome, SearchRequest, StopToken};

use crate::export::{describe_paths, Exporter, ExportFormat};
use crate::table;

pub async fn run(
    config: &AppConfig,
    query: String,
    location: String,
    limit: Option<usize>,
    output: ExportFormat,
    stop: &StopToken,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(config.default_limit);
    let request = SearchRequest::new(query, location, limit);

    println!(
        "Scraping \"{}\" in \"{}\" (limit {limit}) ...",
        request.query, request.location
    );

    let outcome = mapscout_scraper::scrape(config, &request, stop).await?;
    report(config, &request, &outcome, output)
}

/// Prints the results table, exports, and the attempted-vs-succeeded
/// summary. Partial results export like full ones.
pub fn report(
    config: &AppConfig,
    request: &SearchRequest,
    outcome: &ScrapeOutcome,
    output: ExportFormat,
) -> anyhow::Result<()> {
    if outcome.records.is_empty() {
        println!("No results found. Try a different query or location.");
        println!("{}", table::summary_line(&outcome.summary, 0));
        return Ok(());
    }

    println!("{}", table::results_table(&outcome.records));

    let exporter = Exporter::new(&config.output_dir)?;
    let paths = exporter.export(output, &outcome.records, &request.query, &request.location)?;
    println!("Saved: {}", describe_paths(&paths));
    println!("{}", table::summary_line(&outcome.summary, outcome.records.len()));

    Ok(())
}
