//! A filing discovered in the search index.

use chrono::{DateTime, NaiveDate, Utc};
use edgar_client::{EdgarError, SearchHit};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A newly discovered filing, ready to be queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFiling {
    /// Accession number, globally unique.
    pub accession: String,

    /// Form type (e.g. "10-K", "4").
    pub form: String,

    /// Owner identifier as returned by the index, zero padding kept.
    pub cik: String,

    pub company_name: String,

    pub filing_date: Option<NaiveDate>,

    /// Archive URL of the primary document.
    pub url: String,

    /// Direct link supplied by the index, if any.
    pub filing_href: Option<String>,

    pub enqueued_at: DateTime<Utc>,
}

impl DiscoveredFiling {
    /// Create a filing with the given base fields. URL and dates can be set with builders.
    pub fn new(
        accession: impl Into<String>,
        form: impl Into<String>,
        cik: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            accession: accession.into(),
            form: form.into(),
            cik: cik.into(),
            company_name: company_name.into(),
            filing_date: None,
            url: String::new(),
            filing_href: None,
            enqueued_at: Utc::now(),
        }
    }

    /// Build from a raw search hit.
    pub fn from_hit(hit: &SearchHit, archive_root: &str, enqueued_at: DateTime<Utc>) -> Result<Self> {
        if hit.accession().is_empty() {
            return Err(PipelineError::MalformedHit {
                id: hit.id.clone(),
                reason: "hit has no accession number".to_string(),
            });
        }

        let url = hit.document_url(archive_root).map_err(|e| match e {
            EdgarError::MalformedHit { id, reason } => PipelineError::MalformedHit { id, reason },
            other => PipelineError::Search(other),
        })?;

        Ok(Self {
            accession: hit.accession().to_string(),
            form: hit.form().to_string(),
            cik: hit.primary_cik().unwrap_or_default().to_string(),
            company_name: hit.company_name(),
            filing_date: hit.filing_date(),
            url,
            filing_href: hit.filing_href().map(str::to_string),
            enqueued_at,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_filing_date(mut self, date: NaiveDate) -> Self {
        self.filing_date = Some(date);
        self
    }

    pub fn with_filing_href(mut self, href: impl Into<String>) -> Self {
        self.filing_href = Some(href.into());
        self
    }

    pub fn with_enqueued_at(mut self, at: DateTime<Utc>) -> Self {
        self.enqueued_at = at;
        self
    }
}

/// First-seen record for an accession number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub accession: String,
    pub first_seen_at: DateTime<Utc>,
}

/// Result of an insert-if-absent against the seen ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSeen {
    /// This call created the record.
    Inserted,
    /// Some earlier call already created it.
    AlreadyPresent,
}

impl MarkSeen {
    pub fn is_inserted(&self) -> bool {
        matches!(self, MarkSeen::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgar_client::HitSource;

    fn hit() -> SearchHit {
        SearchHit {
            id: "0001193125-20-012345:aapl-10k.htm".to_string(),
            source: HitSource {
                adsh: "0001193125-20-012345".to_string(),
                form: "10-K".to_string(),
                ciks: vec!["0000320193".to_string()],
                company_name: Some("Apple Inc.".to_string()),
                filing_date: Some("2020-10-30".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_from_hit() {
        let now = Utc::now();
        let filing =
            DiscoveredFiling::from_hit(&hit(), "https://www.sec.gov/Archives/edgar/data", now)
                .unwrap();

        assert_eq!(filing.accession, "0001193125-20-012345");
        assert_eq!(filing.form, "10-K");
        assert_eq!(filing.cik, "0000320193");
        assert_eq!(filing.company_name, "Apple Inc.");
        assert_eq!(filing.filing_date, NaiveDate::from_ymd_opt(2020, 10, 30));
        assert!(filing
            .url
            .ends_with("/320193/000119312520012345/aapl-10k.htm"));
        assert_eq!(filing.enqueued_at, now);
    }

    #[test]
    fn test_from_hit_malformed() {
        let mut bad = hit();
        bad.source.ciks.clear();
        let err = DiscoveredFiling::from_hit(&bad, "https://archive", Utc::now()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedHit { .. }));

        let mut no_adsh = hit();
        no_adsh.source.adsh.clear();
        let err = DiscoveredFiling::from_hit(&no_adsh, "https://archive", Utc::now()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedHit { .. }));
    }
}
