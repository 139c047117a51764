//! Output generation for HTML, JSON, and Markdown.
//!
//! # Submodules
//!
//! - [`html`]: Standalone HTML page, the default output
//! - [`json`]: Outcome serialized for scripts and other tools
//! - [`markdown`]: Readable notes format
//!
//! The rendered document goes to stdout unless an output directory is given,
//! in which case it is written to `{output_dir}/{slug}.{ext}`.

pub mod html;
pub mod json;
pub mod markdown;

use crate::cli::Format;
use crate::models::SearchOutcome;
use crate::utils::{ensure_writable_dir, slugify_terms};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Render an outcome in the requested format.
pub fn render(outcome: &SearchOutcome, format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Html => Ok(html::render_document(outcome)),
        Format::Json => json::render_document(outcome),
        Format::Markdown => Ok(markdown::render_document(outcome)),
    }
}

/// Path the document for `outcome` is written to inside `output_dir`.
pub fn output_path(output_dir: &str, outcome: &SearchOutcome, format: Format) -> PathBuf {
    let stem = outcome.terms().map(slugify_terms).unwrap_or_else(|| "error".to_string());
    PathBuf::from(output_dir).join(format!("{stem}.{}", format.extension()))
}

/// Write a rendered document to `output_dir`, or to stdout when `None`.
///
/// Returns the path written, if any.
#[instrument(level = "info", skip_all, fields(?format))]
pub async fn write_document(
    document: &str,
    outcome: &SearchOutcome,
    format: Format,
    output_dir: Option<&str>,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let Some(dir) = output_dir else {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(document.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(None);
    };

    if let Err(e) = ensure_writable_dir(dir).await {
        error!(path = %dir, error = %e, "Output directory is not writable");
        return Err(e.into());
    }

    let path = output_path(dir, outcome, format);
    fs::write(&path, document).await?;
    info!(path = %path.display(), bytes = document.len(), "Wrote document");
    Ok(Some(path))
}
