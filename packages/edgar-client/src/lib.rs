//! Pure EDGAR full-text search client.
//!
//! A minimal client for the EDGAR search index. Fetches one page of hits for a
//! date window and derives archive URLs for the primary documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgar_client::{EdgarClient, PageQuery};
//!
//! let client = EdgarClient::new("filing-watch/0.1 (ops@example.com)");
//! let today = chrono::Local::now().date_naive();
//!
//! let hits = client.search_page(&PageQuery::for_day(today, 1, 100)).await?;
//! for hit in &hits {
//!     println!("{} {}", hit.accession(), hit.document_url(client.archive_root())?);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{EdgarError, Result};
pub use types::{build_document_url, HitSource, PageQuery, SearchHit, SearchResponse, ALL_FORMS};

use std::time::Duration;

pub const DEFAULT_SEARCH_URL: &str = "https://efts.sec.gov/LATEST/search-index";
pub const DEFAULT_ARCHIVE_ROOT: &str = "https://www.sec.gov/Archives/edgar/data";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct EdgarClient {
    client: reqwest::Client,
    search_url: String,
    archive_root: String,
    user_agent: String,
    timeout: Duration,
}

impl EdgarClient {
    /// EDGAR rejects anonymous traffic, so the user agent should carry a contact address.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            user_agent: user_agent.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_archive_root(mut self, root: impl Into<String>) -> Self {
        self.archive_root = root.into();
        self
    }

    /// Per-request timeout. A timed-out request fails only that page.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn archive_root(&self) -> &str {
        &self.archive_root
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch one page of hits, in the order the index returned them.
    pub async fn search_page(&self, query: &PageQuery) -> Result<Vec<SearchHit>> {
        tracing::debug!(
            start = %query.start,
            end = %query.end,
            page = query.page,
            "Fetching search page"
        );

        let resp = self
            .client
            .get(&self.search_url)
            .query(&query.params())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EdgarError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        tracing::debug!(page = query.page, count = parsed.hits.hits.len(), "Fetched search page");

        Ok(parsed.hits.hits)
    }
}
