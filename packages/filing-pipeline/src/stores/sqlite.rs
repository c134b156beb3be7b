//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Good for:
//! - Local development
//! - Single-host deployments of the poller and processor
//! - Testing with persistent data
//!
//! Deduplication relies on the primary key of `seen_filings` together with
//! `INSERT ... ON CONFLICT DO NOTHING`, so it holds across processes and restarts.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::traits::store::{DispatchQueue, SeenLedger};
use crate::types::{
    filing::{DiscoveredFiling, MarkSeen},
    queue::{QueueEntry, QueueStats},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed seen ledger and dispatch queue.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite:filings.db` - File-based database, created if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url).map_err(PipelineError::storage)?;

        if is_memory_url(database_url) {
            Self::connect_memory(options).await
        } else {
            Self::connect_file(options).await
        }
    }

    /// Open (or create) a database file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_file(SqliteConnectOptions::new().filename(path)).await
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    async fn connect_file(options: SqliteConnectOptions) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(PipelineError::storage)?;

        Self::from_pool(pool).await
    }

    // Each in-memory connection is its own database, so keep exactly one alive.
    async fn connect_memory(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(PipelineError::storage)?;

        Self::from_pool(pool).await
    }

    /// Create a store from an existing pool, running migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_filings (
                accession TEXT PRIMARY KEY,
                first_seen_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dispatch_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                accession TEXT NOT NULL UNIQUE,
                form TEXT NOT NULL,
                cik TEXT NOT NULL,
                url TEXT NOT NULL,
                company_name TEXT NOT NULL,
                filing_date TEXT,
                filing_href TEXT,
                enqueued_at TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_dispatch_queue_pending ON dispatch_queue(processed, id);
            CREATE INDEX IF NOT EXISTS idx_dispatch_queue_form ON dispatch_queue(form);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct QueueRow {
    id: i64,
    accession: String,
    form: String,
    cik: String,
    url: String,
    company_name: String,
    filing_date: Option<String>,
    filing_href: Option<String>,
    enqueued_at: String,
    processed: bool,
    attempts: i64,
    last_error: Option<String>,
}

impl QueueRow {
    fn into_entry(self) -> Result<QueueEntry> {
        let enqueued_at = DateTime::parse_from_rfc3339(&self.enqueued_at)
            .map_err(|e| PipelineError::CorruptRow(format!("invalid enqueued_at: {}", e)))?
            .with_timezone(&Utc);

        let filing_date = self
            .filing_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT))
            .transpose()
            .map_err(|e| PipelineError::CorruptRow(format!("invalid filing_date: {}", e)))?;

        let attempts = u32::try_from(self.attempts)
            .map_err(|_| PipelineError::CorruptRow(format!("invalid attempts: {}", self.attempts)))?;

        Ok(QueueEntry {
            id: self.id,
            filing: DiscoveredFiling {
                accession: self.accession,
                form: self.form,
                cik: self.cik,
                company_name: self.company_name,
                filing_date,
                url: self.url,
                filing_href: self.filing_href,
                enqueued_at,
            },
            processed: self.processed,
            attempts,
            last_error: self.last_error,
        })
    }
}

const SELECT_ENTRY: &str = r#"
    SELECT id, accession, form, cik, url, company_name, filing_date, filing_href,
           enqueued_at, processed, attempts, last_error
    FROM dispatch_queue
"#;

#[async_trait]
impl SeenLedger for SqliteStore {
    async fn try_mark_seen(&self, accession: &str, seen_at: DateTime<Utc>) -> Result<MarkSeen> {
        let result = sqlx::query(
            r#"
            INSERT INTO seen_filings (accession, first_seen_at)
            VALUES (?, ?)
            ON CONFLICT(accession) DO NOTHING
            "#,
        )
        .bind(accession)
        .bind(seen_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        if result.rows_affected() == 1 {
            Ok(MarkSeen::Inserted)
        } else {
            Ok(MarkSeen::AlreadyPresent)
        }
    }

    async fn is_seen(&self, accession: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM seen_filings WHERE accession = ?")
                .bind(accession)
                .fetch_optional(&self.pool)
                .await
                .map_err(PipelineError::storage)?;

        Ok(found.is_some())
    }

    async fn seen_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_filings")
            .fetch_one(&self.pool)
            .await
            .map_err(PipelineError::storage)?;

        Ok(count as usize)
    }
}

#[async_trait]
impl DispatchQueue for SqliteStore {
    async fn enqueue(&self, filing: &DiscoveredFiling) -> Result<QueueEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO dispatch_queue
                (accession, form, cik, url, company_name, filing_date, filing_href, enqueued_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&filing.accession)
        .bind(&filing.form)
        .bind(&filing.cik)
        .bind(&filing.url)
        .bind(&filing.company_name)
        .bind(filing.filing_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(&filing.filing_href)
        .bind(filing.enqueued_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => PipelineError::AlreadyQueued {
                accession: filing.accession.clone(),
            },
            _ => PipelineError::storage(e),
        })?;

        Ok(QueueEntry {
            id: result.last_insert_rowid(),
            filing: filing.clone(),
            processed: false,
            attempts: 0,
            last_error: None,
        })
    }

    async fn list_pending(&self) -> Result<Vec<QueueEntry>> {
        let rows: Vec<QueueRow> =
            sqlx::query_as(&format!("{SELECT_ENTRY} WHERE processed = 0 ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(PipelineError::storage)?;

        rows.into_iter().map(|r| r.into_entry()).collect()
    }

    async fn mark_processed(&self, accession: &str) -> Result<()> {
        let result = sqlx::query("UPDATE dispatch_queue SET processed = 1 WHERE accession = ?")
            .bind(accession)
            .execute(&self.pool)
            .await
            .map_err(PipelineError::storage)?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::EntryNotFound {
                accession: accession.to_string(),
            });
        }
        Ok(())
    }

    async fn record_failure(&self, accession: &str, error: &str) -> Result<u32> {
        let attempts: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE dispatch_queue
            SET attempts = attempts + 1, last_error = ?
            WHERE accession = ?
            RETURNING attempts
            "#,
        )
        .bind(error)
        .bind(accession)
        .fetch_optional(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        let attempts = attempts.ok_or_else(|| PipelineError::EntryNotFound {
            accession: accession.to_string(),
        })?;
        u32::try_from(attempts)
            .map_err(|_| PipelineError::CorruptRow(format!("invalid attempts: {}", attempts)))
    }

    async fn get(&self, accession: &str) -> Result<Option<QueueEntry>> {
        let row: Option<QueueRow> = sqlx::query_as(&format!("{SELECT_ENTRY} WHERE accession = ?"))
            .bind(accession)
            .fetch_optional(&self.pool)
            .await
            .map_err(PipelineError::storage)?;

        row.map(|r| r.into_entry()).transpose()
    }

    async fn stats(&self, top_forms: usize) -> Result<QueueStats> {
        let (total, pending): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN processed = 0 THEN 1 ELSE 0 END), 0)
            FROM dispatch_queue
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        let forms: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT form, COUNT(*) AS n
            FROM dispatch_queue
            GROUP BY form
            ORDER BY n DESC, form ASC
            LIMIT ?
            "#,
        )
        .bind(top_forms as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(PipelineError::storage)?;

        let seen = self.seen_count().await?;

        Ok(QueueStats {
            total: total as usize,
            pending: pending as usize,
            processed: (total - pending) as usize,
            seen,
            top_forms: forms.into_iter().map(|(f, n)| (f, n as usize)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn filing(accession: &str, form: &str) -> DiscoveredFiling {
        DiscoveredFiling::new(accession, form, "0000320193", "Apple Inc.")
            .with_url("https://www.sec.gov/Archives/edgar/data/320193/1/doc.htm")
            .with_filing_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[tokio::test]
    async fn test_mark_seen_once() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert!(store.try_mark_seen("a-1", Utc::now()).await.unwrap().is_inserted());
        assert_eq!(
            store.try_mark_seen("a-1", Utc::now()).await.unwrap(),
            MarkSeen::AlreadyPresent
        );
        assert!(store.is_seen("a-1").await.unwrap());
        assert!(!store.is_seen("a-2").await.unwrap());
        assert_eq!(store.seen_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let original = filing("0001193125-20-012345", "10-K").with_filing_href("https://example.com/x");

        let entry = store.enqueue(&original).await.unwrap();
        let loaded = store.get(&original.accession).await.unwrap().unwrap();

        assert_eq!(loaded.id, entry.id);
        assert_eq!(loaded.filing.form, "10-K");
        assert_eq!(loaded.filing.cik, "0000320193");
        assert_eq!(loaded.filing.filing_date, original.filing_date);
        assert_eq!(loaded.filing.filing_href.as_deref(), Some("https://example.com/x"));
        assert_eq!(
            loaded.filing.enqueued_at.timestamp_micros(),
            original.enqueued_at.timestamp_micros()
        );
        assert!(!loaded.processed);
        assert_eq!(loaded.attempts, 0);
    }

    #[tokio::test]
    async fn test_pending_order_and_processing() {
        let store = SqliteStore::in_memory().await.unwrap();
        for accession in ["a-1", "a-2", "a-3"] {
            store.enqueue(&filing(accession, "4")).await.unwrap();
        }

        store.mark_processed("a-2").await.unwrap();
        store.mark_processed("a-2").await.unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(
            pending.iter().map(|e| e.accession()).collect::<Vec<_>>(),
            vec!["a-1", "a-3"]
        );
        assert!(pending[0].id < pending[1].id);

        assert!(matches!(
            store.mark_processed("missing").await,
            Err(PipelineError::EntryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_enqueue_twice_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&filing("a-1", "4")).await.unwrap();

        let err = store.enqueue(&filing("a-1", "4")).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyQueued { .. }));
    }

    #[tokio::test]
    async fn test_record_failure() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.enqueue(&filing("a-1", "10-K")).await.unwrap();

        assert_eq!(store.record_failure("a-1", "first").await.unwrap(), 1);
        assert_eq!(store.record_failure("a-1", "second").await.unwrap(), 2);

        let entry = store.get("a-1").await.unwrap().unwrap();
        assert_eq!(entry.last_error.as_deref(), Some("second"));
        assert!(matches!(
            store.record_failure("missing", "x").await,
            Err(PipelineError::EntryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats() {
        let store = SqliteStore::in_memory().await.unwrap();
        for (accession, form) in [("a-1", "4"), ("a-2", "4"), ("a-3", "10-K")] {
            store.try_mark_seen(accession, Utc::now()).await.unwrap();
            store.enqueue(&filing(accession, form)).await.unwrap();
        }
        store.mark_processed("a-1").await.unwrap();

        let stats = store.stats(5).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.top_forms[0], ("4".to_string(), 2));
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let store = SqliteStore::in_memory().await.unwrap();
        let stats = store.stats(5).await.unwrap();
        assert_eq!(stats, QueueStats::default());
    }

    #[tokio::test]
    async fn test_dedup_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filings.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            assert!(store.try_mark_seen("a-1", Utc::now()).await.unwrap().is_inserted());
            store.enqueue(&filing("a-1", "10-K")).await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(
            store.try_mark_seen("a-1", Utc::now()).await.unwrap(),
            MarkSeen::AlreadyPresent
        );
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_mark_seen_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("race.db")).await.unwrap());

        let handles: Vec<_> = (0..16)
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
}
