//! Utility functions for escaping, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - HTML escaping for untrusted remote text
//! - String truncation and slugification for logging and file names
//! - File system validation for output directories

use std::fs as stdfs;
use std::io;
use tokio::fs;
use tracing::{info, instrument};

/// Escape text for interpolation into HTML.
///
/// Replaces exactly `&`, `<`, `>`, `"` and `'`; every other character passes
/// through, including newlines, so `<pre>` blocks keep their layout.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(escape_html("<script>&\"'"), "&lt;script&gt;&amp;&quot;&#039;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Longest slug, in characters, used for output file names.
pub const MAX_SLUG_CHARS: usize = 100;

/// Convert search terms to a file-name-friendly slug.
///
/// Lowercases the text, removes special characters, and replaces spaces
/// with hyphens. At most [`MAX_SLUG_CHARS`] characters are kept. Falls back
/// to `"results"` when nothing is left.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_terms("KRAS G12D"), "kras-g12d");
/// assert_eq!(slugify_terms("!!!"), "results");
/// ```
pub fn slugify_terms(terms: &str) -> String {
    let slug = terms
        .trim()
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect::<String>();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { "results".to_string() } else { slug.to_string() }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
