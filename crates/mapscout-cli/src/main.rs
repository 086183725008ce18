mod bulk;
mod districts;
mod export;
mod scrape;
mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mapscout_core::AppConfig;
use mapscout_scraper::StopToken;

use crate::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "mapscout", version)]
#[command(about = "Scrape business listings from Google Maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape businesses for a single query
    Scrape {
        /// Search query, e.g. "restaurants" or "coffee shops"
        query: String,

        /// Location to search in
        #[arg(short, long)]
        location: String,

        /// Maximum number of results (defaults to DEFAULT_LIMIT)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        output: ExportFormat,

        /// Run the browser without a visible window
        #[arg(long)]
        headless: bool,
    },

    /// Run every "query|location" line from a file
    Bulk {
        /// File with one "query|location" per line
        queries_file: PathBuf,

        /// Maximum results per query (defaults to DEFAULT_LIMIT)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        output: ExportFormat,

        /// Run the browser without a visible window
        #[arg(long)]
        headless: bool,
    },

    /// List a city's districts from OpenStreetMap, for splitting large scrapes
    Districts {
        /// City name as tagged in OSM, e.g. "Miami"
        city: String,
    },

    /// Print version information
    Version,
}

fn with_headless(config: AppConfig, headless: bool) -> AppConfig {
    if headless {
        AppConfig { headless: true, ..config }
    } else {
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Configuration validation failures abort with a non-zero exit before
    // any browser is started.
    let config = mapscout_core::load_app_config()?;

    let stop = StopToken::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received — wrapping up, partial results will be kept");
                stop.trigger();
            }
        });
    }

    match cli.command {
        Commands::Scrape {
            query,
            location,
            limit,
            output,
            headless,
        } => {
            let config = with_headless(config, headless);
            scrape::run(&config, query, location, limit, output, &stop).await
        }
        Commands::Bulk {
            queries_file,
            limit,
            output,
            headless,
        } => {
            let config = with_headless(config, headless);
            bulk::run(&config, &queries_file, limit, output, &stop).await
        }
        Commands::Districts { city } => {
            let found = districts::fetch_districts(districts::OVERPASS_ENDPOINT, &city).await?;
            if found.is_empty() {
                println!("No districts found for \"{city}\".");
            } else {
                for district in &found {
                    println!("{district}");
                }
                println!("({} districts)", found.len());
            }
            Ok(())
        }
        Commands::Version => {
            println!(
                "{} {}\nGoogle Maps business scraper (chromiumoxide + tokio)",
                env!("CARGO_BIN_NAME"),
                env!("CARGO_PKG_VERSION")
            );
            Ok(())
        }
    }
}
