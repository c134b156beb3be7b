use async_trait::async_trait;

use crate::traits::extractor::FilingExtractor;
use crate::types::{extraction::FormFields, filing::DiscoveredFiling};

/// Insider transactions reported on form 4. Yields no trades until the
/// ownership document parser lands.
pub struct InsiderTradeExtractor;

#[async_trait]
impl FilingExtractor for InsiderTradeExtractor {
    fn name(&self) -> &'static str {
        "insider"
    }

    async fn extract(&self, _filing: &DiscoveredFiling) -> anyhow::Result<FormFields> {
        Ok(FormFields::InsiderTrades { trades: Vec::new() })
    }
}
