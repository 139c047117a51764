//! Data models for queries, extracted articles, and query outcomes.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SearchQuery`]: Validated search terms for a single query
//! - [`ArticleRecord`]: One article summary scraped from the efetch payload
//! - [`ResultsPage`]: All records produced by one query, ready for rendering
//! - [`SearchOutcome`]: What a query run produced, including the non-result cases

use serde::{Deserialize, Serialize};

/// Text substituted for any field that could not be located in a record.
pub const PLACEHOLDER: &str = "N/A";

/// Template for the canonical PubMed detail page of an article.
pub const ARTICLE_URL_TEMPLATE: &str = "https://pubmed.ncbi.nlm.nih.gov/{id}/";

/// A validated, trimmed search term.
///
/// Only constructed through [`SearchQuery::new`], which rejects missing or
/// blank input, so holding one means the terms are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: String,
}

impl SearchQuery {
    /// Build a query from raw user input.
    ///
    /// Returns `None` when the input is absent or blank after trimming.
    pub fn new(raw: Option<&str>) -> Option<Self> {
        let terms = raw?.trim();
        if terms.is_empty() {
            None
        } else {
            Some(Self {
                terms: terms.to_string(),
            })
        }
    }

    pub fn terms(&self) -> &str {
        &self.terms
    }
}

/// A normalized article summary.
///
/// Every field holds either extracted text or [`PLACEHOLDER`], never an
/// empty "missing" value, so renderers never branch on absence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The PubMed identifier (PMID) as returned by esearch.
    pub id: String,
    /// The article title (`ArticleTitle`).
    pub title: String,
    /// Abstract paragraphs joined with a blank line.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// The journal title (`Title`).
    pub journal: String,
    /// The first `Year` found in the record.
    pub year: String,
    /// Canonical PubMed URL derived from `id`.
    pub url: String,
}

/// Build the canonical detail page URL for an identifier.
///
/// The identifier is substituted as-is; its shape is not validated.
pub fn article_url(id: &str) -> String {
    ARTICLE_URL_TEMPLATE.replace("{id}", id)
}

/// All records produced by one query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultsPage {
    /// The trimmed search terms.
    pub terms: String,
    /// Generation time, RFC 3339 in UTC.
    pub generated_at: String,
    /// Records in the order esearch returned their identifiers.
    pub articles: Vec<ArticleRecord>,
}

/// The result of running one query.
///
/// The variants mirror what the user gets to see: a result list, an explicit
/// "no results" notice, a usage error, or a generic failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// At least one identifier matched and its records were extracted.
    Results(ResultsPage),
    /// The search succeeded but matched nothing. Not an error.
    NoResults { terms: String },
    /// No usable search term was supplied; no network call was made.
    UsageError,
    /// Transport, decode, or extraction failure.
    Failed {
        terms: Option<String>,
        message: String,
    },
}

impl SearchOutcome {
    /// The search terms associated with this outcome, when known.
    pub fn terms(&self) -> Option<&str> {
        match self {
            SearchOutcome::Results(page) => Some(&page.terms),
            SearchOutcome::NoResults { terms } => Some(terms),
            SearchOutcome::UsageError => None,
            SearchOutcome::Failed { terms, .. } => terms.as_deref(),
        }
    }
}
