//! Dispatch queue entries.

use serde::{Deserialize, Serialize};

use super::filing::DiscoveredFiling;

/// A discovered filing staged for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Monotonically increasing id; defines processing order.
    pub id: i64,

    pub filing: DiscoveredFiling,

    /// Set once, never cleared.
    pub processed: bool,

    /// Failed extraction attempts (retry policy only).
    pub attempts: u32,

    pub last_error: Option<String>,
}

impl QueueEntry {
    pub fn accession(&self) -> &str {
        &self.filing.accession
    }

    pub fn form(&self) -> &str {
        &self.filing.form
    }
}

/// Queue and ledger counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub processed: usize,
    pub seen: usize,
    /// Form types by entry count, highest first.
    pub top_forms: Vec<(String, usize)>,
}

impl std::fmt::Display for QueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "queue={} pending={} processed={} seen={}",
            self.total, self.pending, self.processed, self.seen
        )
    }
}

/// Sort (form, count) pairs by count descending, then form, and keep `top`.
pub(crate) fn rank_forms(mut counts: Vec<(String, usize)>, top: usize) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(top);
    counts
}
