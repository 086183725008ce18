//! Terminal rendering of scraped results.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use mapscout_core::BusinessRecord;
use mapscout_scraper::ScrapeSummary;

/// Builds the end-of-run results table.
#[must_use]
pub fn results_table(records: &[BusinessRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["#", "Name", "Rating", "Reviews", "Phone", "Category"]);

    for (i, record) in records.iter().enumerate() {
        table.add_row([
            Cell::new(i + 1),
            Cell::new(&record.name),
            Cell::new(record.rating.map_or_else(|| "-".to_owned(), |r| format!("{r:.1}"))),
            Cell::new(
                record
                    .review_count
                    .map_or_else(|| "-".to_owned(), |c| c.to_string()),
            ),
            Cell::new(record.phone.as_deref().unwrap_or("-")),
            Cell::new(record.category.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

/// One line describing how the session went.
#[must_use]
pub fn summary_line(summary: &ScrapeSummary, collected: usize) -> String {
    let mut line = format!(
        "collected {collected} of {} requested ({} attempted, {} succeeded, {} duplicates)",
        summary.requested, summary.attempted, summary.succeeded, summary.duplicates
    );
    if summary.exhausted {
        line.push_str(" — list exhausted early");
    }
    if summary.interrupted {
        line.push_str(" — session interrupted, partial results kept");
    }
    line
}
