//! Extractor registry mapping form types to extraction routines.
//!
//! The registry maps form type strings (e.g., "10-K") to
//! [`FilingExtractor`] implementations. The processor dispatches each dequeued
//! filing through [`ExtractorRegistry::extract`] without knowing the concrete
//! extractor types.
//!
//! Lookup is an exact, case-sensitive match on the form type. Forms with no
//! registered extractor yield [`ExtractionOutcome::NoExtractor`].

mod financial;
mod holdings;
mod insider;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::traits::extractor::FilingExtractor;
use crate::types::{
    extraction::{ExtractedRecord, ExtractionOutcome},
    filing::DiscoveredFiling,
};

pub use financial::FinancialExtractor;
pub use holdings::HoldingsExtractor;
pub use insider::InsiderTradeExtractor;

/// Registry that maps form types to extractors.
///
/// # Example
///
/// ```ignore
/// let mut registry = ExtractorRegistry::new();
/// registry.register("10-K", Arc::new(FinancialExtractor));
///
/// let outcome = registry.extract(&filing.form, &filing).await;
/// ```
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn FilingExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with the built-in extractors for 10-K, 10-Q, 4 and 13F-HR.
    pub fn with_defaults() -> Self {
        let financial: Arc<dyn FilingExtractor> = Arc::new(FinancialExtractor);

        let mut registry = Self::new();
        registry.register("10-K", financial.clone());
        registry.register("10-Q", financial);
        registry.register("4", Arc::new(InsiderTradeExtractor));
        registry.register("13F-HR", Arc::new(HoldingsExtractor));
        registry
    }

    /// Register an extractor for a form type, replacing any previous one.
    pub fn register(&mut self, form: impl Into<String>, extractor: Arc<dyn FilingExtractor>) {
        self.extractors.insert(form.into(), extractor);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, form: impl Into<String>, extractor: Arc<dyn FilingExtractor>) -> Self {
        self.register(form, extractor);
        self
    }

    /// Check if a form type has an extractor.
    pub fn is_registered(&self, form: &str) -> bool {
        self.extractors.contains_key(form)
    }

    /// Get all registered form types, sorted.
    pub fn registered_forms(&self) -> Vec<&str> {
        let mut forms: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        forms.sort_unstable();
        forms
    }

    /// Dispatch a filing to the extractor registered for `form`.
    ///
    /// Never fails: a missing extractor or an extractor error is reported in
    /// the returned outcome.
    pub async fn extract(&self, form: &str, filing: &DiscoveredFiling) -> ExtractionOutcome {
        let Some(extractor) = self.extractors.get(form) else {
            debug!(form, accession = %filing.accession, "no extractor registered");
            return ExtractionOutcome::NoExtractor {
                form: form.to_string(),
            };
        };

        match extractor.extract(filing).await {
            Ok(fields) => {
                ExtractionOutcome::Extracted(ExtractedRecord::from_filing(filing, fields, Utc::now()))
            }
            Err(e) => {
                warn!(
                    form,
                    accession = %filing.accession,
                    extractor = extractor.name(),
                    error = %e,
                    "extraction failed"
                );
                ExtractionOutcome::Failed {
                    form: form.to_string(),
                    error: format!("{:#}", e),
                }
            }
        }
    }
}
