//! Runtime configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Every key is optional; an absent file means defaults,
//! which reproduce the plain unauthenticated E-utilities requests.
//!
//! ```yaml
//! esearch_url: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//! efetch_url: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi
//! api_key: null
//! retmax: 20
//! timeout_secs: 30
//! decode_entities: false
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const DEFAULT_ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
pub const DEFAULT_EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Effective settings for one run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// esearch endpoint.
    pub esearch_url: String,
    /// efetch endpoint.
    pub efetch_url: String,
    /// NCBI API key, sent as `api_key` on both calls when set.
    pub api_key: Option<String>,
    /// Maximum number of identifiers esearch should return.
    pub retmax: Option<u32>,
    /// Per-request timeout. No timeout when unset.
    pub timeout_secs: Option<u64>,
    /// Decode XML entities in extracted fields.
    pub decode_entities: bool,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            esearch_url: DEFAULT_ESEARCH_URL.to_string(),
            efetch_url: DEFAULT_EFETCH_URL.to_string(),
            api_key: None,
            retmax: None,
            timeout_secs: None,
            decode_entities: false,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load settings from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: display.clone(),
                source,
            })?;
        let settings = Self::from_yaml(&yaml, &display)?;
        info!("Loaded configuration");
        Ok(settings)
    }

    /// Load the file named on the command line (if any) and apply flag overrides.
    pub async fn resolve(args: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &args.config {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        settings.apply_overrides(args);
        debug!(?settings.esearch_url, ?settings.efetch_url, retmax = ?settings.retmax, "Resolved settings");
        Ok(settings)
    }

    fn apply_overrides(&mut self, args: &Cli) {
        if let Some(key) = &args.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(retmax) = args.retmax {
            self.retmax = Some(retmax);
        }
        if let Some(timeout) = args.timeout_secs {
            self.timeout_secs = Some(timeout);
        }
        if args.decode_entities {
            self.decode_entities = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_point_at_ncbi() {
        let settings = Settings::default();
        assert_eq!(settings.esearch_url, DEFAULT_ESEARCH_URL);
        assert_eq!(settings.efetch_url, DEFAULT_EFETCH_URL);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.retmax, None);
        assert!(!settings.decode_entities);
        assert!(settings.user_agent.starts_with("pubmed_lite/"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("retmax: 5\ndecode_entities: true\n", "inline").unwrap();
        assert_eq!(settings.retmax, Some(5));
        assert!(settings.decode_entities);
        assert_eq!(settings.esearch_url, DEFAULT_ESEARCH_URL);
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let err = Settings::from_yaml("retmax: [not a number", "bad.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut settings = Settings::from_yaml("api_key: from-file\nretmax: 5\n", "inline").unwrap();
        let args = Cli::parse_from([
            "pubmed_lite",
            "--terms",
            "flu",
            "--api-key",
            "from-flag",
            "--decode-entities",
        ]);
        settings.apply_overrides(&args);

        assert_eq!(settings.api_key.as_deref(), Some("from-flag"));
        assert_eq!(settings.retmax, Some(5));
        assert!(settings.decode_entities);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let err = Settings::load("/definitely/not/here.yaml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
