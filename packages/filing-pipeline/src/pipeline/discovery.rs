//! The dedup barrier between the search index and the dispatch queue.

use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::traits::store::FilingStore;
use crate::types::{filing::DiscoveredFiling, queue::QueueEntry};

/// What happened to a filing at the dedup barrier.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    /// First sighting; the filing is now in the dispatch queue.
    Queued(QueueEntry),
    /// Already seen, discarded.
    Duplicate,
}

impl DiscoveryOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, DiscoveryOutcome::Queued(_))
    }
}

/// Mark the filing seen and, if this call was the first to see it, enqueue it.
///
/// The seen mark is written before the queue entry. A crash between the two
/// loses that filing rather than queueing it twice.
pub async fn discover<S>(store: &S, filing: &DiscoveredFiling) -> Result<DiscoveryOutcome>
where
    S: FilingStore + ?Sized,
{
    let marked = store
        .try_mark_seen(&filing.accession, filing.enqueued_at)
        .await?;

    if !marked.is_inserted() {
        return Ok(DiscoveryOutcome::Duplicate);
    }

    match store.enqueue(filing).await {
        Ok(entry) => {
            info!(
                accession = %filing.accession,
                form = %filing.form,
                cik = %filing.cik,
                company = %filing.company_name,
                "new filing queued"
            );
            Ok(DiscoveryOutcome::Queued(entry))
        }
        // Seen ledger was reset under an existing queue
        Err(PipelineError::AlreadyQueued { accession }) => {
            warn!(accession = %accession, "filing already queued");
            Ok(DiscoveryOutcome::Duplicate)
        }
        Err(e) => Err(e),
    }
}
