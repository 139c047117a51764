//! Query orchestration.
//!
//! Runs one query end to end: validate terms, esearch, efetch, extract. Each
//! step awaits the previous one; there is no retry and no partial result. Any
//! failure turns the whole run into [`SearchOutcome::Failed`].

use crate::eutils::{EutilsError, LiteratureSource};
use crate::extractor::{ExtractError, RecordExtractor};
use crate::models::{ResultsPage, SearchOutcome, SearchQuery};
use chrono::{SecondsFormat, Utc};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Eutils(#[from] EutilsError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Run a query from raw user input and classify the result.
///
/// Blank or missing terms yield [`SearchOutcome::UsageError`] without touching
/// `source`. Errors are logged here and reported through the outcome.
#[instrument(level = "info", skip_all)]
pub async fn run_query<S: LiteratureSource>(
    source: &S,
    extractor: &RecordExtractor,
    raw_terms: Option<&str>,
) -> SearchOutcome {
    let Some(query) = SearchQuery::new(raw_terms) else {
        warn!("No search terms supplied");
        return SearchOutcome::UsageError;
    };

    let t0 = Instant::now();
    match search_and_fetch(source, extractor, &query).await {
        Ok(Some(page)) => {
            info!(
                terms = %query.terms(),
                count = page.articles.len(),
                elapsed_ms = t0.elapsed().as_millis() as u128,
                "Query complete"
            );
            SearchOutcome::Results(page)
        }
        Ok(None) => {
            info!(terms = %query.terms(), "No results found");
            SearchOutcome::NoResults {
                terms: query.terms().to_string(),
            }
        }
        Err(e) => {
            error!(terms = %query.terms(), error = %e, "Query failed");
            SearchOutcome::Failed {
                terms: Some(query.terms().to_string()),
                message: e.to_string(),
            }
        }
    }
}

/// Search, then fetch and extract. `Ok(None)` means the search matched nothing.
pub async fn search_and_fetch<S: LiteratureSource>(
    source: &S,
    extractor: &RecordExtractor,
    query: &SearchQuery,
) -> Result<Option<ResultsPage>, SearchError> {
    let ids = source.search(query).await?;
    if ids.is_empty() {
        return Ok(None);
    }

    let raw = source.fetch(&ids).await?;
    let articles = extractor.extract(&raw, &ids)?;

    Ok(Some(ResultsPage {
        terms: query.terms().to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        articles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::eutils::EutilsClient;
    use crate::outputs::html;
    use mockito::Matcher;
    use std::cell::{Cell, RefCell};

    /// Canned source that records how it was called.
    #[derive(Default)]
    struct FakeSource {
        ids: Vec<String>,
        xml: String,
        fail_fetch: bool,
        searches: Cell<usize>,
        fetched: RefCell<Vec<Vec<String>>>,
    }

    impl LiteratureSource for FakeSource {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<String>, EutilsError> {
            self.searches.set(self.searches.get() + 1);
            Ok(self.ids.clone())
        }

        async fn fetch(&self, ids: &[String]) -> Result<String, EutilsError> {
            self.fetched.borrow_mut().push(ids.to_vec());
            if self.fail_fetch {
                return Err(EutilsError::Status {
                    endpoint: "efetch",
                    status: reqwest::StatusCode::BAD_GATEWAY,
                });
            }
            Ok(self.xml.clone())
        }
    }

    fn article(pmid: &str, title: &str) -> String {
        format!(
            "<PubmedArticle><PMID>{pmid}</PMID><Journal><PubDate><Year>2020</Year></PubDate>\
             <Title>Journal {pmid}</Title></Journal><ArticleTitle>{title}</ArticleTitle>\
             <Abstract><AbstractText>Abstract {pmid}</AbstractText></Abstract></PubmedArticle>"
        )
    }

    #[tokio::test]
    async fn test_missing_terms_make_no_calls() {
        let source = FakeSource::default();
        let extractor = RecordExtractor::default();

        assert!(matches!(
            run_query(&source, &extractor, None).await,
            SearchOutcome::UsageError
        ));
        assert!(matches!(
            run_query(&source, &extractor, Some("   ")).await,
            SearchOutcome::UsageError
        ));
        assert_eq!(source.searches.get(), 0);
        assert!(source.fetched.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_skips_fetch() {
        let source = FakeSource::default();
        let outcome = run_query(&source, &RecordExtractor::default(), Some(" zzzz ")).await;

        match outcome {
            SearchOutcome::NoResults { terms } => assert_eq!(terms, "zzzz"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(source.searches.get(), 1);
        assert!(source.fetched.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_two_records_in_order() {
        let source = FakeSource {
            ids: vec!["1".to_string(), "2".to_string()],
            xml: format!(
                "<PubmedArticleSet>{}{}</PubmedArticleSet>",
                article("1", "One"),
                article("2", "Two")
            ),
            ..FakeSource::default()
        };

        let outcome = run_query(&source, &RecordExtractor::default(), Some("test")).await;
        let SearchOutcome::Results(page) = outcome else {
            panic!("expected results");
        };

        assert_eq!(page.terms, "test");
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.articles[0].id, "1");
        assert_eq!(page.articles[0].title, "One");
        assert_eq!(page.articles[0].journal, "Journal 1");
        assert_eq!(page.articles[0].year, "2020");
        assert_eq!(page.articles[0].abstract_text, "Abstract 1");
        assert_eq!(page.articles[1].id, "2");
        assert_eq!(page.articles[1].title, "Two");
        assert_eq!(*source.fetched.borrow(), vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let source = FakeSource {
            ids: vec!["1".to_string()],
            fail_fetch: true,
            ..FakeSource::default()
        };

        let outcome = run_query(&source, &RecordExtractor::default(), Some("test")).await;
        match outcome {
            SearchOutcome::Failed { terms, message } => {
                assert_eq!(terms.as_deref(), Some("test"));
                assert_eq!(message, "efetch returned HTTP 502 Bad Gateway");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_count_mismatch_fails() {
        let source = FakeSource {
            ids: vec!["1".to_string(), "2".to_string()],
            xml: article("1", "One"),
            ..FakeSource::default()
        };

        let outcome = run_query(&source, &RecordExtractor::default(), Some("test")).await;
        match outcome {
            SearchOutcome::Failed { message, .. } => {
                assert_eq!(message, "expected 2 article records in efetch response, found 1");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_against_mock_eutils() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::UrlEncoded("term".into(), "kras".into()))
            .with_status(200)
            .with_body(r#"{"esearchresult":{"idlist":["1","2"]}}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::UrlEncoded("id".into(), "1,2".into()))
            .with_status(200)
            .with_body(format!("{}{}", article("1", "One"), article("2", "Two")))
            .create_async()
            .await;

        let settings = Settings {
            esearch_url: format!("{}/esearch.fcgi", server.url()),
            efetch_url: format!("{}/efetch.fcgi", server.url()),
            ..Settings::default()
        };
        let client = EutilsClient::new(&settings).unwrap();
        let outcome = run_query(&client, &RecordExtractor::default(), Some("kras")).await;

        let SearchOutcome::Results(page) = outcome else {
            panic!("expected results");
        };
        let ids: Vec<&str> = page.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        search.assert_async().await;
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_search_never_hits_efetch() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult":{"idlist":[]}}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let settings = Settings {
            esearch_url: format!("{}/esearch.fcgi", server.url()),
            efetch_url: format!("{}/efetch.fcgi", server.url()),
            ..Settings::default()
        };
        let client = EutilsClient::new(&settings).unwrap();
        let outcome = run_query(&client, &RecordExtractor::default(), Some("nothing")).await;

        assert!(matches!(outcome, SearchOutcome::NoResults { .. }));
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_efetch_server_error_renders_failure_block() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult":{"idlist":["1"]}}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let settings = Settings {
            esearch_url: format!("{}/esearch.fcgi", server.url()),
            efetch_url: format!("{}/efetch.fcgi", server.url()),
            ..Settings::default()
        };
        let client = EutilsClient::new(&settings).unwrap();
        let outcome = run_query(&client, &RecordExtractor::default(), Some("<b>flu</b>")).await;

        assert!(matches!(outcome, SearchOutcome::Failed { .. }));
        let page = html::render_document(&outcome);
        assert!(page.contains("<h2>Client Error</h2>"));
        assert!(page.contains("<pre>efetch returned HTTP 500 Internal Server Error</pre>"));
        assert!(page.contains("PubMed Results for: &quot;&lt;b&gt;flu&lt;/b&gt;&quot;"));
        assert!(!page.contains("<b>flu</b>"));
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_efetch_transport_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult":{"idlist":["1"]}}"#)
            .create_async()
            .await;

        // Nothing listens on port 9 (discard) on a test host.
        let settings = Settings {
            esearch_url: format!("{}/esearch.fcgi", server.url()),
            efetch_url: "http://127.0.0.1:9/efetch.fcgi".to_string(),
            ..Settings::default()
        };
        let client = EutilsClient::new(&settings).unwrap();
        let outcome = run_query(&client, &RecordExtractor::default(), Some("flu")).await;

        let SearchOutcome::Failed { message, .. } = &outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.starts_with("request failed"));
        let page = html::render_document(&outcome);
        assert!(page.contains("<h2>Client Error</h2>"));
        assert!(page.contains(&format!("<pre>{}</pre>", crate::utils::escape_html(message))));
    }
}
