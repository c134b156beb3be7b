//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the filing pipeline
//! without making real search requests or parsing real documents.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use edgar_client::{EdgarError, HitSource, PageQuery, SearchHit, DEFAULT_ARCHIVE_ROOT};

use crate::traits::{extractor::FilingExtractor, search::SearchIndex, sink::SignalSink};
use crate::types::{extraction::FormFields, filing::DiscoveredFiling, signal::Signal};

/// Build a well-formed search hit with primary document `primary.htm`.
pub fn hit(accession: &str, form: &str, cik: &str) -> SearchHit {
    SearchHit {
        id: format!("{accession}:primary.htm"),
        source: HitSource {
            adsh: accession.to_string(),
            form: form.to_string(),
            ciks: vec![cik.to_string()],
            company_name: Some(format!("Company {cik}")),
            filing_date: Some("2024-03-04".to_string()),
            ..Default::default()
        },
    }
}

/// `count` hits with accessions `<prefix>-0000`, `<prefix>-0001`, ...
pub fn hits(prefix: &str, form: &str, count: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| hit(&format!("{prefix}-{i:04}"), form, "0000320193"))
        .collect()
}

type PageFn = Arc<dyn Fn(u32) -> Vec<SearchHit> + Send + Sync>;

enum ScriptedPage {
    Hits(Vec<SearchHit>),
    Failure { status: u16, message: String },
}

/// A mock search index for testing.
///
/// Serves scripted pages in order, one per request. Once the script runs out
/// it serves the `repeating` page, or an empty page if none is set.
pub struct MockSearchIndex {
    script: RwLock<VecDeque<ScriptedPage>>,
    fallback: Option<PageFn>,
    archive_root: String,
    latency: Duration,

    /// Call tracking for assertions
    calls: RwLock<Vec<PageQuery>>,
    started: RwLock<Vec<Instant>>,
}

impl Default for MockSearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchIndex {
    pub fn new() -> Self {
        Self {
            script: RwLock::new(VecDeque::new()),
            fallback: None,
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            latency: Duration::ZERO,
            calls: RwLock::new(Vec::new()),
            started: RwLock::new(Vec::new()),
        }
    }

    /// Queue a page of hits.
    pub fn with_page(self, hits: Vec<SearchHit>) -> Self {
        self.script.write().unwrap().push_back(ScriptedPage::Hits(hits));
        self
    }

    /// Queue a failed request with the given HTTP status.
    pub fn with_failure(self, status: u16, message: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(ScriptedPage::Failure {
            status,
            message: message.into(),
        });
        self
    }

    /// Serve `page_fn(page_number)` once the script is exhausted.
    pub fn repeating(mut self, page_fn: impl Fn(u32) -> Vec<SearchHit> + Send + Sync + 'static) -> Self {
        self.fallback = Some(Arc::new(page_fn));
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// When each request started, in call order.
    pub fn call_times(&self) -> Vec<Instant> {
        self.started.read().unwrap().clone()
    }

    /// Get all queries made to this mock.
    pub fn calls(&self) -> Vec<PageQuery> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for MockSearchIndex {
    async fn fetch_page(&self, query: &PageQuery) -> edgar_client::Result<Vec<SearchHit>> {
        self.calls.write().unwrap().push(query.clone());
        self.started.write().unwrap().push(Instant::now());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.write().unwrap().pop_front();
        match next {
            Some(ScriptedPage::Hits(hits)) => Ok(hits),
            Some(ScriptedPage::Failure { status, message }) => Err(EdgarError::Api { status, message }),
            None => Ok(self
                .fallback
                .as_ref()
                .map(|page_fn| page_fn(query.page))
                .unwrap_or_default()),
        }
    }

    fn archive_root(&self) -> &str {
        &self.archive_root
    }
}

/// Extractor that returns the same fields for every filing.
pub struct StaticExtractor {
    fields: FormFields,
    calls: RwLock<Vec<String>>,
}

impl StaticExtractor {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn unstructured() -> Self {
        Self::new(FormFields::Unstructured)
    }

    /// Accessions extracted so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl FilingExtractor for StaticExtractor {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn extract(&self, filing: &DiscoveredFiling) -> anyhow::Result<FormFields> {
        self.calls.write().unwrap().push(filing.accession.clone());
        Ok(self.fields.clone())
    }
}

/// Extractor that always fails with the given message.
pub struct FailingExtractor {
    message: String,
}

impl FailingExtractor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl FilingExtractor for FailingExtractor {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn extract(&self, filing: &DiscoveredFiling) -> anyhow::Result<FormFields> {
        anyhow::bail!("{} ({})", self.message, filing.accession)
    }
}

/// Sink that keeps every published signal in memory.
#[derive(Default)]
pub struct RecordingSink {
    signals: RwLock<Vec<Signal>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every signal.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.read().unwrap().clone()
    }
}

#[async_trait]
impl SignalSink for RecordingSink {
    async fn publish(&self, signal: &Signal) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("sink unavailable");
        }
        self.signals.write().unwrap().push(signal.clone());
        Ok(())
    }
}
