//! Command-line interface definitions for pubmed_lite.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Search terms can come from `--terms`, from the `terms` query parameter of
//! a `--location` URL, or from the `PUBMED_TERMS` environment variable.

use clap::{Parser, ValueEnum};
use url::Url;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Html,
    Json,
    Markdown,
}

impl Format {
    /// File extension used when writing into `--output-dir`.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Json => "json",
            Format::Markdown => "md",
        }
    }
}

/// Command-line arguments for pubmed_lite.
///
/// # Examples
///
/// ```sh
/// # Render an HTML page to stdout
/// pubmed_lite --terms "kras pancreatic cancer"
///
/// # Take the terms from a page URL, write JSON into ./out
/// pubmed_lite --location "https://example.org/search?terms=cancer" -f json -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search terms
    #[arg(short, long, env = "PUBMED_TERMS")]
    pub terms: Option<String>,

    /// Page URL whose `terms` query parameter holds the search terms
    #[arg(short, long)]
    pub location: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    pub format: Format,

    /// Directory to write the rendered document into (stdout when omitted)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// NCBI E-utilities API key
    #[arg(long, env = "NCBI_API_KEY")]
    pub api_key: Option<String>,

    /// Maximum number of articles to request
    #[arg(long)]
    pub retmax: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Decode XML entities in extracted fields
    #[arg(long)]
    pub decode_entities: bool,
}

impl Cli {
    /// The raw search terms, before validation.
    ///
    /// `--terms` wins over `--location`. An unparsable location yields `None`.
    pub fn raw_terms(&self) -> Option<String> {
        if let Some(terms) = &self.terms {
            return Some(terms.clone());
        }
        self.location.as_deref().and_then(terms_from_location)
    }
}

/// Read the `terms` query parameter from a page URL.
pub fn terms_from_location(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "terms")
        .map(|(_, value)| value.into_owned())
}
