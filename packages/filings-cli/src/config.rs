use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use edgar_client::{EdgarClient, DEFAULT_TIMEOUT};
use filing_pipeline::{FailurePolicy, PollerConfig, ProcessorConfig};

const DEFAULT_DATABASE_URL: &str = "sqlite:filings.db";
const DEFAULT_USER_AGENT: &str = "filing-watch/0.1 (ops@example.com)";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub user_agent: String,
    pub search_url: Option<String>,
    pub archive_root: Option<String>,
    /// Empty means every form type.
    pub forms: Vec<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_jitter: Duration,
    pub process_interval: Duration,
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secs = |key: &str, default: u64| -> Result<Duration> {
            match var(key) {
                Some(v) => Ok(Duration::from_secs(
                    v.trim()
                        .parse()
                        .with_context(|| format!("{key} must be a whole number of seconds"))?,
                )),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let poll_jitter = match var("POLL_JITTER_MS") {
            Some(v) => Duration::from_millis(
                v.trim()
                    .parse()
                    .context("POLL_JITTER_MS must be a whole number of milliseconds")?,
            ),
            None => Duration::ZERO,
        };

        let failure_policy = match var("FAILURE_POLICY") {
            Some(v) => v
                .parse()
                .context("FAILURE_POLICY must be `mark-processed` or `retry:<attempts>`")?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            user_agent: var("EDGAR_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            search_url: var("EDGAR_SEARCH_URL"),
            archive_root: var("EDGAR_ARCHIVE_ROOT"),
            forms: var("EDGAR_FORMS")
                .map(|v| parse_forms(&v))
                .unwrap_or_default(),
            request_timeout: secs("EDGAR_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?,
            poll_interval: secs("POLL_INTERVAL_SECS", 60)?,
            poll_jitter,
            process_interval: secs("PROCESS_INTERVAL_SECS", 30)?,
            failure_policy,
        })
    }

    pub fn is_postgres(&self) -> bool {
        self.database_url.starts_with("postgres://") || self.database_url.starts_with("postgresql://")
    }

    pub fn edgar_client(&self) -> EdgarClient {
        let mut client = EdgarClient::new(&self.user_agent).with_timeout(self.request_timeout);
        if let Some(url) = &self.search_url {
            client = client.with_search_url(url);
        }
        if let Some(root) = &self.archive_root {
            client = client.with_archive_root(root);
        }
        client
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::default()
            .with_forms(self.forms.iter().cloned())
            .with_poll_interval(self.poll_interval)
            .with_jitter(self.poll_jitter)
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig::default()
            .with_failure_policy(self.failure_policy)
            .with_poll_interval(self.process_interval)
    }
}

fn parse_forms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite:filings.db");
        assert!(config.forms.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.poll_jitter, Duration::ZERO);
        assert_eq!(config.process_interval, Duration::from_secs(30));
        assert_eq!(config.failure_policy, FailurePolicy::MarkProcessed);
        assert!(!config.is_postgres());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/filings"),
            ("EDGAR_FORMS", "10-K, 4,,13F-HR"),
            ("POLL_INTERVAL_SECS", "5"),
            ("POLL_JITTER_MS", "200"),
            ("FAILURE_POLICY", "retry:3"),
        ])
        .unwrap();

        assert!(config.is_postgres());
        assert_eq!(config.forms, vec!["10-K", "4", "13F-HR"]);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.poll_jitter, Duration::from_millis(200));
        assert_eq!(config.failure_policy, FailurePolicy::Retry { max_attempts: 3 });

        let poller = config.poller_config();
        assert_eq!(poller.forms, vec!["10-K", "4", "13F-HR"]);
        assert_eq!(poller.jitter, Duration::from_millis(200));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("POLL_INTERVAL_SECS", "soon")]).is_err());
        assert!(config(&[("FAILURE_POLICY", "never")]).is_err());
    }
}
