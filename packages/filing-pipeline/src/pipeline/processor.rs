//! Filing processor: drains the dispatch queue through the extractors.
//!
//! The `FilingProcessor` is a long-running service that:
//! - Lists pending queue entries, oldest first
//! - Dispatches each to its extractor via `ExtractorRegistry`
//! - Derives a signal from every successful extraction and publishes it
//! - Marks entries processed according to the `FailurePolicy`
//!
//! # Architecture
//!
//! ```text
//! FilingProcessor
//!     │
//!     ├─► list_pending (DispatchQueue)
//!     ├─► extract (ExtractorRegistry) → ExtractionOutcome
//!     │       └─► Extracted → SignalGenerator → SignalSink
//!     └─► mark_processed / record_failure (DispatchQueue)
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::extractors::ExtractorRegistry;
use crate::signals::{SignalGenerator, SignalPolicy};
use crate::traits::{
    sink::{NoopSink, SignalSink},
    store::FilingStore,
};
use crate::types::{
    config::{FailurePolicy, ProcessorConfig},
    extraction::ExtractionOutcome,
    queue::QueueEntry,
};

/// Result of processing one queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub accession: String,
    pub outcome: ExtractionOutcome,

    /// False when a failed entry was left pending for another attempt.
    pub processed: bool,
}

/// Outcomes of one pass over the pending entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub entries: Vec<EntryReport>,

    /// Signals generated during the pass.
    pub signals: usize,
}

impl PassReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extracted(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_extracted()).count()
    }

    pub fn no_extractor(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_no_extractor()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failed()).count()
    }

    /// Entries still pending after the pass.
    pub fn retained(&self) -> usize {
        self.entries.iter().filter(|e| !e.processed).count()
    }
}

/// Consumes the dispatch queue.
pub struct FilingProcessor<S: ?Sized> {
    store: Arc<S>,
    registry: Arc<ExtractorRegistry>,
    signals: SignalGenerator,
    sink: Arc<dyn SignalSink>,
    config: ProcessorConfig,
}

impl<S: FilingStore + ?Sized> FilingProcessor<S> {
    /// Create a processor with the pass-through policy and no sink.
    pub fn new(store: Arc<S>, registry: Arc<ExtractorRegistry>) -> Self {
        Self {
            store,
            registry,
            signals: SignalGenerator::default(),
            sink: Arc::new(NoopSink),
            config: ProcessorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn SignalPolicy>) -> Self {
        self.signals = SignalGenerator::new(policy);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The signal accumulator.
    pub fn signals(&self) -> &SignalGenerator {
        &self.signals
    }

    /// Process a snapshot of the pending entries, oldest first.
    ///
    /// Entries enqueued during the pass are left for the next one. A store
    /// failure ends the pass and is returned.
    pub async fn run_once(&mut self) -> Result<PassReport> {
        let pending = self.store.list_pending().await?;
        let mut report = PassReport::default();

        if pending.is_empty() {
            return Ok(report);
        }

        debug!(worker_id = %self.config.worker_id, count = pending.len(), "processing pending filings");

        let before = self.signals.len();
        for entry in &pending {
            report.entries.push(self.process_entry(entry).await?);
        }
        report.signals = self.signals.len() - before;

        Ok(report)
    }

    /// Extract one entry, publish its signal, and settle its queue state.
    pub async fn process_entry(&mut self, entry: &QueueEntry) -> Result<EntryReport> {
        let outcome = self.registry.extract(entry.form(), &entry.filing).await;

        let processed = match &outcome {
            ExtractionOutcome::Extracted(record) => {
                let signal = self.signals.process(record);
                if let Err(e) = self.sink.publish(signal).await {
                    warn!(accession = %entry.accession(), error = %e, "signal sink rejected signal");
                }
                true
            }
            ExtractionOutcome::NoExtractor { .. } => true,
            ExtractionOutcome::Failed { error, .. } => match self.config.failure_policy {
                FailurePolicy::MarkProcessed => true,
                FailurePolicy::Retry { max_attempts } => {
                    let attempts = self.store.record_failure(entry.accession(), error).await?;
                    if attempts >= max_attempts {
                        warn!(
                            accession = %entry.accession(),
                            attempts,
                            "giving up on filing after repeated failures"
                        );
                        true
                    } else {
                        false
                    }
                }
            },
        };

        if processed {
            self.store.mark_processed(entry.accession()).await?;
        }

        debug!(
            accession = %entry.accession(),
            form = %entry.form(),
            outcome = outcome.label(),
            processed,
            "filing processed"
        );

        Ok(EntryReport {
            accession: entry.accession().to_string(),
            outcome,
            processed,
        })
    }

    /// Run passes on the configured interval until cancelled.
    ///
    /// Signals are handed to the sink as they are generated and dropped from
    /// the accumulator after each pass.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            worker_id = %self.config.worker_id,
            interval_secs = self.config.poll_interval.as_secs(),
            extractors = ?self.registry.registered_forms(),
            "filing processor starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.run_once().await {
                Ok(report) if report.is_empty() => {}
                Ok(report) => info!(
                    entries = report.entries.len(),
                    extracted = report.extracted(),
                    no_extractor = report.no_extractor(),
                    failed = report.failed(),
                    retained = report.retained(),
                    signals = report.signals,
                    "processing pass finished"
                ),
                Err(e) => error!(error = %e, "processing pass failed"),
            }
            self.signals.clear();

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker_id = %self.config.worker_id, "filing processor stopped");
    }
}
