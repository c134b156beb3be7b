//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{hash_map::Entry, HashMap};
use std::sync::RwLock;

use crate::error::{PipelineError, Result};
use crate::traits::store::{DispatchQueue, SeenLedger};
use crate::types::{
    filing::{DiscoveredFiling, MarkSeen, SeenRecord},
    queue::{rank_forms, QueueEntry, QueueStats},
};

/// In-memory seen ledger and dispatch queue.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryStore {
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
    queue: RwLock<Vec<QueueEntry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            seen: RwLock::new(HashMap::new()),
            queue: RwLock::new(Vec::new()),
        }
    }

    /// Get the first-seen record for an accession.
    pub fn seen_record(&self, accession: &str) -> Option<SeenRecord> {
        self.seen
            .read()
            .unwrap()
            .get(accession)
            .map(|first_seen_at| SeenRecord {
                accession: accession.to_string(),
                first_seen_at: *first_seen_at,
            })
    }

    /// Get the number of queue entries.
    pub fn queue_len(&self) -> usize {
        self.queue.read().unwrap().len()
    }
}

#[async_trait]
impl SeenLedger for MemoryStore {
    async fn try_mark_seen(&self, accession: &str, seen_at: DateTime<Utc>) -> Result<MarkSeen> {
        // Check and insert under one write lock.
        match self.seen.write().unwrap().entry(accession.to_string()) {
            Entry::Occupied(_) => Ok(MarkSeen::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(seen_at);
                Ok(MarkSeen::Inserted)
            }
        }
    }

    async fn is_seen(&self, accession: &str) -> Result<bool> {
        Ok(self.seen.read().unwrap().contains_key(accession))
    }

    async fn seen_count(&self) -> Result<usize> {
        Ok(self.seen.read().unwrap().len())
    }
}

#[async_trait]
impl DispatchQueue for MemoryStore {
    async fn enqueue(&self, filing: &DiscoveredFiling) -> Result<QueueEntry> {
        let mut queue = self.queue.write().unwrap();

        if queue.iter().any(|e| e.filing.accession == filing.accession) {
            return Err(PipelineError::AlreadyQueued {
                accession: filing.accession.clone(),
            });
        }

        let id = queue.last().map(|e| e.id + 1).unwrap_or(1);
        let entry = QueueEntry {
            id,
            filing: filing.clone(),
            processed: false,
            attempts: 0,
            last_error: None,
        };
        queue.push(entry.clone());
        Ok(entry)
    }

    async fn list_pending(&self) -> Result<Vec<QueueEntry>> {
        Ok(self
            .queue
            .read()
            .unwrap()
            .iter()
            .filter(|e| !e.processed)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, accession: &str) -> Result<()> {
        let mut queue = self.queue.write().unwrap();
        let entry = queue
            .iter_mut()
            .find(|e| e.filing.accession == accession)
            .ok_or_else(|| PipelineError::EntryNotFound {
                accession: accession.to_string(),
            })?;
        entry.processed = true;
        Ok(())
    }

    async fn record_failure(&self, accession: &str, error: &str) -> Result<u32> {
        let mut queue = self.queue.write().unwrap();
        let entry = queue
            .iter_mut()
            .find(|e| e.filing.accession == accession)
            .ok_or_else(|| PipelineError::EntryNotFound {
                accession: accession.to_string(),
            })?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        Ok(entry.attempts)
    }

    async fn get(&self, accession: &str) -> Result<Option<QueueEntry>> {
        Ok(self
            .queue
            .read()
            .unwrap()
            .iter()
            .find(|e| e.filing.accession == accession)
            .cloned())
    }

    async fn stats(&self, top_forms: usize) -> Result<QueueStats> {
        let seen = self.seen.read().unwrap().len();
        let queue = self.queue.read().unwrap();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in queue.iter() {
            *counts.entry(entry.form()).or_default() += 1;
        }
        let counts = counts
            .into_iter()
            .map(|(form, n)| (form.to_string(), n))
            .collect();

        let processed = queue.iter().filter(|e| e.processed).count();
        Ok(QueueStats {
            total: queue.len(),
            pending: queue.len() - processed,
            processed,
            seen,
            top_forms: rank_forms(counts, top_forms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn filing(accession: &str, form: &str) -> DiscoveredFiling {
        DiscoveredFiling::new(accession, form, "0000320193", "Apple Inc.")
    }

    #[tokio::test]
    async fn test_mark_seen_once() {
        let store = MemoryStore::new();
        let now = Utc::now();

        assert_eq!(store.try_mark_seen("a-1", now).await.unwrap(), MarkSeen::Inserted);
        assert_eq!(
            store.try_mark_seen("a-1", Utc::now()).await.unwrap(),
            MarkSeen::AlreadyPresent
        );
        assert!(store.is_seen("a-1").await.unwrap());
        assert!(!store.is_seen("a-2").await.unwrap());
        assert_eq!(store.seen_count().await.unwrap(), 1);

        // First-seen timestamp is not overwritten
        assert_eq!(store.seen_record("a-1").unwrap().first_seen_at, now);
    }

    #[tokio::test]
    async fn test_concurrent_mark_seen() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.try_mark_seen("race", Utc::now()).await.unwrap() })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_inserted() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.seen_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_lifecycle() {
        let store = MemoryStore::new();

        let first = store.enqueue(&filing("a-1", "10-K")).await.unwrap();
        let second = store.enqueue(&filing("a-2", "4")).await.unwrap();
        assert!(first.id < second.id);
        assert!(!first.processed);

        let pending = store.list_pending().await.unwrap();
        assert_eq!(
            pending.iter().map(|e| e.accession()).collect::<Vec<_>>(),
            vec!["a-1", "a-2"]
        );

        store.mark_processed("a-1").await.unwrap();
        store.mark_processed("a-1").await.unwrap();
        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].accession(), "a-2");

        assert!(store.get("a-1").await.unwrap().unwrap().processed);
        assert!(matches!(
            store.mark_processed("missing").await,
            Err(PipelineError::EntryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_enqueue_twice_rejected() {
        let store = MemoryStore::new();
        store.enqueue(&filing("a-1", "10-K")).await.unwrap();

        let err = store.enqueue(&filing("a-1", "10-K")).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyQueued { .. }));
        assert_eq!(store.queue_len(), 1);
    }

    #[tokio::test]
    async fn test_record_failure() {
        let store = MemoryStore::new();
        store.enqueue(&filing("a-1", "10-K")).await.unwrap();

        assert_eq!(store.record_failure("a-1", "boom").await.unwrap(), 1);
        assert_eq!(store.record_failure("a-1", "boom again").await.unwrap(), 2);

        let entry = store.get("a-1").await.unwrap().unwrap();
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error.as_deref(), Some("boom again"));
        assert!(!entry.processed);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = MemoryStore::new();
        for (accession, form) in [("a-1", "4"), ("a-2", "4"), ("a-3", "10-K"), ("a-4", "8-K")] {
            store.try_mark_seen(accession, Utc::now()).await.unwrap();
            store.enqueue(&filing(accession, form)).await.unwrap();
        }
        store.mark_processed("a-3").await.unwrap();

        let stats = store.stats(2).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.seen, 4);
        assert_eq!(
            stats.top_forms,
            vec![("4".to_string(), 2), ("10-K".to_string(), 1)]
        );
    }
}
