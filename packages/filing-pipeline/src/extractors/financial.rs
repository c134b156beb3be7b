use async_trait::async_trait;

use crate::traits::extractor::FilingExtractor;
use crate::types::{
    extraction::{FinancialFields, FormFields},
    filing::DiscoveredFiling,
};

/// Headline financials for annual and quarterly reports (10-K, 10-Q).
///
/// Parsing the XBRL financial statements is not implemented yet; every
/// metric comes back unset.
pub struct FinancialExtractor;

#[async_trait]
impl FilingExtractor for FinancialExtractor {
    fn name(&self) -> &'static str {
        "financial"
    }

    async fn extract(&self, _filing: &DiscoveredFiling) -> anyhow::Result<FormFields> {
        Ok(FormFields::Financials(FinancialFields::default()))
    }
}
