use async_trait::async_trait;

use crate::traits::extractor::FilingExtractor;
use crate::types::{extraction::FormFields, filing::DiscoveredFiling};

/// Institutional positions from 13F-HR information tables.
pub struct HoldingsExtractor;

#[async_trait]
impl FilingExtractor for HoldingsExtractor {
    fn name(&self) -> &'static str {
        "holdings"
    }

    async fn extract(&self, _filing: &DiscoveredFiling) -> anyhow::Result<FormFields> {
        // TODO: parse the information table XML linked from the filing index.
        Ok(FormFields::Holdings {
            holdings: Vec::new(),
        })
    }
}
