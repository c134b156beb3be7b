//! Filing Discovery and Dispatch Pipeline
//!
//! Continuously discovers new filings in the EDGAR full-text search index,
//! deduplicates them by accession number against a persistent ledger, and
//! stages each new filing in a durable queue for extraction and signal
//! generation.
//!
//! # Flow
//!
//! ```text
//! Poller → SeenLedger (dedup) → DispatchQueue → FilingProcessor
//!                                                   ├─► ExtractorRegistry
//!                                                   └─► SignalGenerator → SignalSink
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edgar_client::EdgarClient;
//! use filing_pipeline::{ExtractorRegistry, FilingProcessor, Poller, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::new("sqlite:filings.db").await?);
//! let client = EdgarClient::new("my-app/1.0 (ops@example.com)");
//!
//! // Discover today's filings
//! let poller = Poller::new(client, store.clone());
//! let report = poller.poll_date(today, &poller.config().live).await?;
//!
//! // Drain the queue once
//! let mut processor = FilingProcessor::new(store, Arc::new(ExtractorRegistry::with_defaults()));
//! let pass = processor.run_once().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (SearchIndex, FilingStore, FilingExtractor, SignalSink)
//! - [`types`] - Filings, queue entries, extracted records, signals and config
//! - [`pipeline`] - Discovery, polling, backfill and processing
//! - [`extractors`] - Form type to extractor registry
//! - [`signals`] - Signal derivation and scoring policies
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore, PostgresStore)
//!   The Postgres tests start a container and only build with `--features postgres`.
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extractors;
pub mod pipeline;
pub mod signals;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{PipelineError, Result};
pub use traits::{
    extractor::FilingExtractor,
    search::SearchIndex,
    sink::{NoopSink, SignalSink},
    store::{DispatchQueue, FilingStore, SeenLedger},
};

pub use types::{
    config::{FailurePolicy, PageBounds, PollerConfig, ProcessorConfig},
    extraction::{
        ExtractedRecord, ExtractionOutcome, FinancialFields, FormFields, Holding, InsiderTrade,
    },
    filing::{DiscoveredFiling, MarkSeen, SeenRecord},
    queue::{QueueEntry, QueueStats},
    signal::Signal,
};

pub use extractors::{
    ExtractorRegistry, FinancialExtractor, HoldingsExtractor, InsiderTradeExtractor,
};
pub use pipeline::{
    business_days_back, business_days_between, discover, is_business_day, BackfillReport,
    CycleReport, DiscoveryOutcome, EntryReport, FilingProcessor, PassReport, Poller,
};
pub use signals::{derive_signal, PassThroughPolicy, SignalGenerator, SignalPolicy, SignalScore};

// Re-export storage backends
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
