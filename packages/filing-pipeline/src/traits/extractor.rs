//! Extractor trait for form-specific parsing.

use async_trait::async_trait;

use crate::types::{extraction::FormFields, filing::DiscoveredFiling};

/// Pulls kind-specific fields out of one filing.
///
/// Implementations only produce [`FormFields`]; the
/// [`ExtractorRegistry`](crate::extractors::ExtractorRegistry) attaches the base
/// fields, so every record carries form, CIK, filing date and company name.
#[async_trait]
pub trait FilingExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn extract(&self, filing: &DiscoveredFiling) -> anyhow::Result<FormFields>;
}
