//! Search index poller.
//!
//! The `Poller` walks every page of search results for a date, turns each hit
//! into a [`DiscoveredFiling`] and pushes it through the dedup barrier.
//!
//! # Architecture
//!
//! ```text
//! Poller
//!     │
//!     ├─► pages_for_date (page 1, 2, ... until short/empty page or max_pages)
//!     │       └─► SearchIndex.fetch_page
//!     ├─► DiscoveredFiling::from_hit (malformed hits skipped)
//!     └─► discover (try_mark_seen, then enqueue)
//! ```
//!
//! A failed page request ends the current date early. Hits from earlier pages
//! have already been discovered and are kept. Only store failures are
//! returned as errors.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use chrono::{Local, NaiveDate, Utc};
use edgar_client::{PageQuery, SearchHit};
use futures::{Stream, StreamExt};
use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::discovery::{discover, DiscoveryOutcome};
use crate::error::{PipelineError, Result};
use crate::traits::{search::SearchIndex, store::FilingStore};
use crate::types::{
    config::{PageBounds, PollerConfig},
    filing::DiscoveredFiling,
};

/// Boxed stream borrowed from a poller.
pub type PollStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Counts for one polled date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub date: NaiveDate,

    /// Pages fetched successfully.
    pub pages: u32,

    pub hits: usize,
    pub new: usize,
    pub duplicate: usize,
    pub malformed: usize,

    /// Why the date ended early, if it did.
    pub aborted: Option<String>,
}

impl CycleReport {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            pages: 0,
            hits: 0,
            new: 0,
            duplicate: 0,
            malformed: 0,
            aborted: None,
        }
    }

    /// True when every page for the date was walked.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Polls the search index and feeds new filings into the store.
pub struct Poller<I, S: ?Sized> {
    index: I,
    store: Arc<S>,
    config: PollerConfig,
}

impl<I, S> Poller<I, S>
where
    I: SearchIndex,
    S: FilingStore + ?Sized,
{
    /// Create a poller with default configuration.
    pub fn new(index: I, store: Arc<S>) -> Self {
        Self {
            index,
            store,
            config: PollerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stream the pages of hits for one date, in API order.
    ///
    /// Stops after an empty page, a page shorter than `page_size`, or
    /// `max_pages` pages. A failed request is yielded as the last item.
    pub fn pages_for_date<'a>(
        &'a self,
        date: NaiveDate,
        bounds: &'a PageBounds,
    ) -> PollStream<'a, Vec<SearchHit>> {
        Box::pin(stream! {
            for page in 1..=bounds.max_pages {
                if page > 1 && !bounds.page_delay.is_zero() {
                    tokio::time::sleep(bounds.page_delay).await;
                }

                let query = PageQuery::for_day(date, page, bounds.page_size)
                    .with_forms(&self.config.forms);

                match self.index.fetch_page(&query).await {
                    Ok(hits) => {
                        let count = hits.len();
                        debug!(%date, page, count, "fetched search page");

                        if count == 0 {
                            break;
                        }
                        yield Ok(hits);
                        if count < bounds.page_size as usize {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(PipelineError::Search(e));
                        break;
                    }
                }
            }
        })
    }

    /// Stream every hit for one date, in API order.
    pub fn hits_for_date<'a>(
        &'a self,
        date: NaiveDate,
        bounds: &'a PageBounds,
    ) -> PollStream<'a, SearchHit> {
        Box::pin(stream! {
            let mut pages = self.pages_for_date(date, bounds);
            while let Some(page) = pages.next().await {
                match page {
                    Ok(hits) => {
                        for hit in hits {
                            yield Ok(hit);
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Walk one date and discover every hit on it.
    ///
    /// Fetch failures end the date early and are recorded in the report.
    /// Store failures are returned.
    pub async fn poll_date(&self, date: NaiveDate, bounds: &PageBounds) -> Result<CycleReport> {
        let mut report = CycleReport::new(date);
        let mut pages = self.pages_for_date(date, bounds);

        while let Some(page) = pages.next().await {
            match page {
                Ok(hits) => {
                    report.pages += 1;
                    for hit in &hits {
                        report.hits += 1;
                        self.ingest(hit, &mut report).await?;
                    }
                }
                Err(e) => {
                    let transient = matches!(&e, PipelineError::Search(inner) if inner.is_transient());
                    warn!(
                        %date,
                        page = report.pages + 1,
                        transient,
                        error = %e,
                        "search request failed, ending cycle"
                    );
                    report.aborted = Some(e.to_string());
                }
            }
        }

        Ok(report)
    }

    async fn ingest(&self, hit: &SearchHit, report: &mut CycleReport) -> Result<()> {
        let filing = match DiscoveredFiling::from_hit(hit, self.index.archive_root(), Utc::now()) {
            Ok(filing) => filing,
            Err(PipelineError::MalformedHit { id, reason }) => {
                warn!(id = %id, reason = %reason, "skipping malformed hit");
                report.malformed += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match discover(self.store.as_ref(), &filing).await? {
            DiscoveryOutcome::Queued(_) => report.new += 1,
            DiscoveryOutcome::Duplicate => report.duplicate += 1,
        }
        Ok(())
    }

    /// Poll today's date on the configured cadence until cancelled.
    ///
    /// The cadence is measured from the start of each cycle.
    pub async fn run_live(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            forms = ?self.config.forms,
            "live poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let started = Instant::now();
            let today = Local::now().date_naive();

            match self.poll_date(today, &self.config.live).await {
                Ok(report) => info!(
                    date = %report.date,
                    pages = report.pages,
                    hits = report.hits,
                    new = report.new,
                    duplicate = report.duplicate,
                    malformed = report.malformed,
                    complete = report.is_complete(),
                    "poll cycle finished"
                ),
                Err(e) => error!(date = %today, error = %e, "poll cycle failed"),
            }

            let wait = cycle_delay(self.config.poll_interval, self.config.jitter)
                .saturating_sub(started.elapsed());

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("live poller stopped");
    }
}

/// The live cadence with a uniform random offset in `[-jitter, +jitter]`.
pub(crate) fn cycle_delay(interval: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis() as i64;
    if jitter_ms == 0 {
        return interval;
    }

    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);
    let total = interval.as_millis() as i64 + offset;
    Duration::from_millis(total.max(0) as u64)
}
