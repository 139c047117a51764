//! Markdown rendering.
//!
//! One `##` section per article with the journal line in italics, the
//! abstract as a block quote, and a link to the PubMed page.
//!
//! Markdown passes inline HTML through, so every interpolated field goes
//! through [`escape_html`]. Single-line positions (headings, the meta line)
//! also have their whitespace collapsed so embedded newlines cannot end them.

use crate::models::{ArticleRecord, SearchOutcome};
use crate::utils::escape_html;

/// Render the full Markdown document for an outcome.
pub fn render_document(outcome: &SearchOutcome) -> String {
    let mut md = match outcome.terms() {
        Some(terms) => format!("# PubMed Results for: \"{}\"\n\n", inline(terms)),
        None => "# PubMed Results\n\n".to_string(),
    };

    match outcome {
        SearchOutcome::Results(page) => {
            for article in &page.articles {
                md.push_str(&render_article(article));
            }
        }
        SearchOutcome::NoResults { terms } => {
            md.push_str(&format!("## No results found\n\nSearch: {}\n", inline(terms)));
        }
        SearchOutcome::UsageError => {
            md.push_str("## Error\n\nPlease provide search terms, e.g. `--terms cancer`.\n");
        }
        SearchOutcome::Failed { message, .. } => {
            md.push_str(&format!("## Client Error\n\n{}\n", quote(message)));
        }
    }
    md
}

fn render_article(article: &ArticleRecord) -> String {
    format!(
        "## {}\n\n*{} • {}*\n\n{}\n\n[View on PubMed ({})]({})\n\n",
        inline(&article.title),
        inline(&article.journal),
        inline(&article.year),
        quote(&article.abstract_text),
        inline(&article.id),
        escape_html(&article.url)
    )
}

/// Escape and collapse whitespace for text that must stay on one line.
fn inline(text: &str) -> String {
    escape_html(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Escape and render as a block quote, keeping blank lines inside the quote.
fn quote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ">".to_string()
            } else {
                format!("> {}", escape_html(line))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
