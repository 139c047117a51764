//! Record extraction from efetch XML text.
//!
//! The efetch payload is treated as flat text rather than parsed as a
//! document. It is cut into one block per `<PubmedArticle>` marker and each
//! block is scanned with first-match tag patterns:
//!
//! | Field | Tag | Matches |
//! |-------|-----|---------|
//! | title | `ArticleTitle` | first |
//! | journal | `Title` | first |
//! | year | `Year` | first |
//! | abstract | `AbstractText` | all, joined with a blank line |
//!
//! Opening tags may carry any attributes. Nesting is not understood: the
//! first `<Year>` in a block wins even if it belongs to a revision date.
//! Missing tags produce [`PLACEHOLDER`] instead of an error.

use crate::models::{article_url, ArticleRecord, PLACEHOLDER};
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Literal that starts every serialized article in the efetch response.
pub const RECORD_START_MARKER: &str = "<PubmedArticle>";

static TITLE_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("ArticleTitle"));
static JOURNAL_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("Title"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("Year"));
static ABSTRACT_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("AbstractText"));

/// Build `<tag ...>(inner)</tag>` with a lazy, newline-spanning capture.
///
/// The boundary after the tag name is ASCII-only: `<Titleé>` counts as a
/// `Title` tag with trailing junk, `<TitleX>` does not.
fn tag_pattern(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    Regex::new(&format!(r"(?s)<{tag}(?-u:\b)[^>]*>(.*?)</{tag}>")).expect("tag pattern is valid")
}

/// Errors raised while pairing record blocks with identifiers.
///
/// Malformed or missing field tags never error; only a structural mismatch
/// between the payload and the requested identifiers does.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("expected {expected} article records in efetch response, found {found}")]
    RecordCountMismatch { expected: usize, found: usize },
}

/// Turns efetch text into [`ArticleRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordExtractor {
    /// Decode XML entities (`&amp;`, `&lt;`, ...) in extracted text.
    pub decode_entities: bool,
}

impl RecordExtractor {
    pub fn new(decode_entities: bool) -> Self {
        Self { decode_entities }
    }

    /// Extract one record per identifier, in identifier order.
    ///
    /// The text before the first [`RECORD_START_MARKER`] is discarded and the
    /// i-th block is paired with `ids[i]`. A payload holding a different
    /// number of blocks than `ids` is rejected rather than truncated.
    #[instrument(level = "info", skip_all, fields(ids = ids.len(), bytes = raw_text.len()))]
    pub fn extract(&self, raw_text: &str, ids: &[String]) -> Result<Vec<ArticleRecord>, ExtractError> {
        let blocks: Vec<&str> = split_records(raw_text).collect();
        if blocks.len() != ids.len() {
            warn!(
                expected = ids.len(),
                found = blocks.len(),
                "Record count does not match requested identifiers"
            );
            return Err(ExtractError::RecordCountMismatch {
                expected: ids.len(),
                found: blocks.len(),
            });
        }

        let records: Vec<ArticleRecord> = blocks
            .into_iter()
            .zip(ids)
            .map(|(block, id)| self.extract_record(block, id))
            .collect();

        debug!(count = records.len(), "Extracted article records");
        Ok(records)
    }

    /// Extract the fields of a single record block.
    pub fn extract_record(&self, block: &str, id: &str) -> ArticleRecord {
        ArticleRecord {
            id: id.to_string(),
            title: self.first_match(&TITLE_RE, block),
            abstract_text: self.all_matches(&ABSTRACT_RE, block),
            journal: self.first_match(&JOURNAL_RE, block),
            year: self.first_match(&YEAR_RE, block),
            url: article_url(id),
        }
    }

    fn first_match(&self, re: &Regex, block: &str) -> String {
        re.captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| self.clean(m.as_str()))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    fn all_matches(&self, re: &Regex, block: &str) -> String {
        let parts: Vec<String> = re
            .captures_iter(block)
            .filter_map(|caps| caps.get(1))
            .map(|m| self.clean(m.as_str()))
            .collect();

        if parts.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            parts.join("\n\n")
        }
    }

    fn clean(&self, text: &str) -> String {
        let text = text.trim();
        if !self.decode_entities {
            return text.to_string();
        }
        match unescape(text) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                debug!(error = %e, "Entity decoding failed; keeping raw text");
                text.to_string()
            }
        }
    }
}

/// Split raw efetch text into record blocks, dropping the preamble.
pub fn split_records(raw_text: &str) -> impl Iterator<Item = &str> {
    raw_text.split(RECORD_START_MARKER).skip(1)
}
