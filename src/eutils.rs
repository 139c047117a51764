//! NCBI E-utilities client.
//!
//! Two calls are used, always in this order:
//!
//! 1. **esearch** (`retmode=json`): search terms to an ordered PMID list
//! 2. **efetch** (`retmode=xml`): PMID list to the raw article XML text
//!
//! The client only moves bytes. Interpreting the XML belongs to
//! [`crate::extractor`].

use crate::config::Settings;
use crate::models::SearchQuery;
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum EutilsError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected esearch response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Source of PubMed identifiers and article payloads.
///
/// The orchestrator is written against this trait so it can run against a
/// canned source in tests.
pub trait LiteratureSource {
    /// Run a search and return matching identifiers in rank order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, EutilsError>;

    /// Fetch the raw XML text for the given identifiers.
    async fn fetch(&self, ids: &[String]) -> Result<String, EutilsError>;
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    #[serde(default)]
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Parse an esearch JSON body into its identifier list.
///
/// A body without `esearchresult.idlist` is an empty result; a body that is
/// not JSON is an error.
pub fn parse_esearch(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let response: EsearchResponse = serde_json::from_str(body)?;
    Ok(response
        .esearchresult
        .map(|result| result.idlist)
        .unwrap_or_default())
}

/// HTTP client for the esearch and efetch endpoints.
#[derive(Debug, Clone)]
pub struct EutilsClient {
    client: Client,
    esearch_url: String,
    efetch_url: String,
    api_key: Option<String>,
    retmax: Option<u32>,
}

impl EutilsClient {
    pub fn new(settings: &Settings) -> Result<Self, EutilsError> {
        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            esearch_url: settings.esearch_url.clone(),
            efetch_url: settings.efetch_url.clone(),
            api_key: settings.api_key.clone(),
            retmax: settings.retmax,
        })
    }

    /// esearch request URL for `query`.
    pub fn search_url(&self, query: &SearchQuery) -> String {
        let mut url = format!(
            "{}?db=pubmed&retmode=json&term={}",
            self.esearch_url,
            urlencoding::encode(query.terms())
        );
        if let Some(retmax) = self.retmax {
            url.push_str(&format!("&retmax={retmax}"));
        }
        self.push_api_key(&mut url);
        url
    }

    /// efetch request URL for `ids`.
    pub fn fetch_url(&self, ids: &[String]) -> String {
        let joined = ids.iter().map(|id| urlencoding::encode(id)).join(",");
        let mut url = format!("{}?db=pubmed&id={}&retmode=xml", self.efetch_url, joined);
        self.push_api_key(&mut url);
        url
    }

    fn push_api_key(&self, url: &mut String) {
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(&urlencoding::encode(key));
        }
    }

    async fn get_text(&self, endpoint: &'static str, url: &str) -> Result<String, EutilsError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EutilsError::Status { endpoint, status });
        }
        let body = response.text().await?;
        debug!(
            endpoint,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Received response"
        );
        Ok(body)
    }
}

impl LiteratureSource for EutilsClient {
    #[instrument(level = "info", skip_all, fields(terms = %query.terms()))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, EutilsError> {
        let body = self.get_text("esearch", &self.search_url(query)).await?;
        let ids = parse_esearch(&body)?;
        info!(count = ids.len(), "esearch returned PMIDs");
        debug!(?ids, "PMIDs");
        Ok(ids)
    }

    #[instrument(level = "info", skip_all, fields(ids = ids.len()))]
    async fn fetch(&self, ids: &[String]) -> Result<String, EutilsError> {
        let body = self.get_text("efetch", &self.fetch_url(ids)).await?;
        info!(bytes = body.len(), "efetch returned article XML");
        Ok(body)
    }
}
