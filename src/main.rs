//! # pubmed_lite
//!
//! Search PubMed through the NCBI E-utilities API and render the matching
//! articles as an HTML page, JSON, or Markdown.
//!
//! ## Usage
//!
//! ```sh
//! pubmed_lite --terms "kras pancreatic cancer" > results.html
//! pubmed_lite --location "https://example.org/?terms=malaria" -f json -o ./out
//! ```
//!
//! ## Architecture
//!
//! One query runs as a straight pipeline:
//! 1. **Validation**: Terms must be present and non-blank
//! 2. **Search**: esearch returns the ranked PMID list
//! 3. **Fetch**: efetch returns the article XML for those PMIDs
//! 4. **Extraction**: Fields are scraped out of each `<PubmedArticle>` block
//! 5. **Output**: The outcome is rendered and written to stdout or a file
//!
//! Every outcome is rendered, errors included. The exit status is 0 for
//! results and for an empty search, 2 for missing terms, 1 for failures.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod eutils;
mod extractor;
mod models;
mod outputs;
mod search;
mod utils;

use cli::Cli;
use config::Settings;
use eutils::EutilsClient;
use extractor::RecordExtractor;
use models::SearchOutcome;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("pubmed_lite starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.format, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    // ---- Load settings ----
    let settings = Settings::resolve(&args).await?;
    let extractor = RecordExtractor::new(settings.decode_entities);

    // ---- Run the query ----
    let raw_terms = args.raw_terms();
    let outcome = match EutilsClient::new(&settings) {
        Ok(client) => search::run_query(&client, &extractor, raw_terms.as_deref()).await,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            SearchOutcome::Failed {
                terms: raw_terms.map(|t| t.trim().to_string()),
                message: e.to_string(),
            }
        }
    };

    // ---- Output ----
    let document = outputs::render(&outcome, args.format)?;
    if let Some(path) =
        outputs::write_document(&document, &outcome, args.format, args.output_dir.as_deref()).await?
    {
        info!(path = %path.display(), "Output written");
    }

    let elapsed = start_time.elapsed();
    let code = match &outcome {
        SearchOutcome::Results(page) => {
            info!(articles = page.articles.len(), "Rendered results");
            ExitCode::SUCCESS
        }
        SearchOutcome::NoResults { .. } => ExitCode::SUCCESS,
        SearchOutcome::UsageError => {
            error!("No search terms: pass --terms, --location with ?terms=, or set PUBMED_TERMS");
            ExitCode::from(2)
        }
        SearchOutcome::Failed { message, .. } => {
            error!(error = %utils::truncate_for_log(message, 300), "Search failed");
            ExitCode::FAILURE
        }
    };

    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(code)
}
