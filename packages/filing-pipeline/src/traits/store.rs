//! Storage traits for the seen ledger and the dispatch queue.
//!
//! The storage layer is split into focused traits:
//! - `SeenLedger`: atomic insert-if-absent over accession numbers
//! - `DispatchQueue`: durable, ordered staging of discovered filings
//! - `FilingStore`: composite trait combining both

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    filing::{DiscoveredFiling, MarkSeen},
    queue::{QueueEntry, QueueStats},
};

/// Persistent record of every accession number ever seen.
#[async_trait]
pub trait SeenLedger: Send + Sync {
    /// Record `accession` as seen unless it already is.
    ///
    /// Must be atomic: of any number of concurrent calls for the same
    /// accession, exactly one returns `Inserted`. Records are never removed.
    async fn try_mark_seen(&self, accession: &str, seen_at: DateTime<Utc>) -> Result<MarkSeen>;

    /// Whether `accession` has been seen.
    async fn is_seen(&self, accession: &str) -> Result<bool>;

    /// Number of distinct accessions seen.
    async fn seen_count(&self) -> Result<usize>;
}

/// Durable queue of discovered-but-unprocessed filings.
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    /// Append a filing with `processed = false` and the next id.
    ///
    /// Callers enqueue only after `try_mark_seen` returned `Inserted`.
    async fn enqueue(&self, filing: &DiscoveredFiling) -> Result<QueueEntry>;

    /// All unprocessed entries, oldest first.
    async fn list_pending(&self) -> Result<Vec<QueueEntry>>;

    /// Mark an entry processed. Marking twice is a no-op.
    async fn mark_processed(&self, accession: &str) -> Result<()>;

    /// Record a failed extraction attempt. Returns the new attempt count.
    async fn record_failure(&self, accession: &str, error: &str) -> Result<u32>;

    /// Look up the entry for an accession.
    async fn get(&self, accession: &str) -> Result<Option<QueueEntry>>;

    /// Queue counts plus the `top_forms` most common form types.
    async fn stats(&self, top_forms: usize) -> Result<QueueStats>;
}

/// Composite storage trait combining the ledger and the queue.
///
/// This is the trait the poller and the processor are generic over.
pub trait FilingStore: SeenLedger + DispatchQueue {}

// Blanket implementation: anything implementing both traits is a FilingStore
impl<T: SeenLedger + DispatchQueue> FilingStore for T {}
