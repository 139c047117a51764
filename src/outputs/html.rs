//! HTML rendering.
//!
//! Produces a standalone document with a `#page-title` heading and a
//! `#results` region. All remote and user-supplied text passes through
//! [`escape_html`] before it is interpolated.

use crate::models::{ArticleRecord, SearchOutcome};
use crate::utils::escape_html;

/// Render the results region for an outcome.
pub fn render_results(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Results(page) => page.articles.iter().map(render_article).collect(),
        SearchOutcome::NoResults { terms } => format!(
            "\n      <h2>No results found</h2>\n      <p>Search: {}</p>",
            escape_html(terms)
        ),
        SearchOutcome::UsageError => "\n      <h2>Error</h2>\n      \
             <p>Please provide <code>?terms=</code> in the URL, e.g. <code>?terms=cancer</code></p>"
            .to_string(),
        SearchOutcome::Failed { message, .. } => format!(
            "\n      <h2>Client Error</h2>\n      <pre>{}</pre>",
            escape_html(message)
        ),
    }
}

/// Render one article block.
pub fn render_article(article: &ArticleRecord) -> String {
    format!(
        r#"
      <article>
        <h2>{title}</h2>
        <div class="meta">{journal} • {year}</div>
        <pre>{abstract_text}</pre>
        <p>
          🔗 <a href="{url}" target="_blank" rel="noopener noreferrer">
            View on PubMed ({id})
          </a>
        </p>
      </article>
    "#,
        title = escape_html(&article.title),
        journal = escape_html(&article.journal),
        year = escape_html(&article.year),
        abstract_text = escape_html(&article.abstract_text),
        url = escape_html(&article.url),
        id = escape_html(&article.id),
    )
}

/// Render the full HTML document for an outcome.
pub fn render_document(outcome: &SearchOutcome) -> String {
    let heading = match outcome.terms() {
        Some(terms) => format!("PubMed Results for: &quot;{}&quot;", escape_html(terms)),
        None => "PubMed Results".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{heading}</title>
</head>
<body>
  <h1 id="page-title">{heading}</h1>
  <div id="results">{results}</div>
</body>
</html>
"#,
        results = render_results(outcome),
    )
}
