//! Typed errors for the filing pipeline.
//!
//! Uses `thiserror` for library errors. Duplicates, missing extractors and
//! extraction failures are ordinary outcomes, not errors; see
//! [`crate::types::extraction::ExtractionOutcome`].

use thiserror::Error;

/// Errors that can occur while discovering or processing filings.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Search index request failed (timeout, non-success status, bad body)
    #[error("search error: {0}")]
    Search(#[from] edgar_client::EdgarError),

    /// A hit could not be turned into a filing
    #[error("malformed hit {id}: {reason}")]
    MalformedHit { id: String, reason: String },

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored row could not be decoded
    #[error("corrupt row: {0}")]
    CorruptRow(String),

    /// Accession is already in the dispatch queue
    #[error("already queued: {accession}")]
    AlreadyQueued { accession: String },

    /// Queue entry referenced by accession does not exist
    #[error("queue entry not found: {accession}")]
    EntryNotFound { accession: String },

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        PipelineError::Storage(Box::new(err))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
