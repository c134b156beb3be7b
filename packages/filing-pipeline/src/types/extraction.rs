//! Extracted records and per-item extraction outcomes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::filing::DiscoveredFiling;

/// Headline financial metrics from periodic reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialFields {
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
}

/// One reported insider transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub insider_name: Option<String>,
    pub title: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub transaction_code: Option<String>,
    pub shares_traded: Option<i64>,
    pub shares_owned_after: Option<i64>,
    pub price_per_share: Option<f64>,
    pub total_value: Option<f64>,
}

/// One position from an institutional holdings report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub issuer_name: Option<String>,
    pub cusip: Option<String>,
    pub shares_held: Option<i64>,
    pub market_value: Option<f64>,
    pub investment_discretion: Option<String>,
}

/// Kind-specific fields. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormFields {
    Financials(FinancialFields),
    InsiderTrades { trades: Vec<InsiderTrade> },
    Holdings { holdings: Vec<Holding> },
    #[default]
    Unstructured,
}

/// Output of a successful extraction. Base fields are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub form: String,
    pub cik: String,
    pub filing_date: Option<NaiveDate>,
    pub company_name: String,
    pub fields: FormFields,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedRecord {
    /// Base fields copied from the filing.
    pub fn from_filing(filing: &DiscoveredFiling, fields: FormFields, extracted_at: DateTime<Utc>) -> Self {
        Self {
            form: filing.form.clone(),
            cik: filing.cik.clone(),
            filing_date: filing.filing_date,
            company_name: filing.company_name.clone(),
            fields,
            extracted_at,
        }
    }
}

/// What happened when a dequeued filing was dispatched for extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Extracted(ExtractedRecord),
    /// No extractor registered for this form type.
    NoExtractor { form: String },
    /// The extractor ran and failed.
    Failed { form: String, error: String },
}

impl ExtractionOutcome {
    pub fn record(&self) -> Option<&ExtractedRecord> {
        match self {
            ExtractionOutcome::Extracted(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted(_))
    }

    pub fn is_no_extractor(&self) -> bool {
        matches!(self, ExtractionOutcome::NoExtractor { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Extracted(_) => "extracted",
            ExtractionOutcome::NoExtractor { .. } => "no_extractor",
            ExtractionOutcome::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_tagged_by_kind() {
        let fields = FormFields::InsiderTrades {
            trades: vec![InsiderTrade {
                insider_name: Some("Jane Doe".to_string()),
                transaction_code: Some("S".to_string()),
                shares_traded: Some(1_000),
                ..Default::default()
            }],
        };

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["kind"], "insider_trades");
        assert_eq!(json["trades"][0]["insider_name"], "Jane Doe");

        let unstructured = serde_json::to_value(FormFields::Unstructured).unwrap();
        assert_eq!(unstructured, serde_json::json!({ "kind": "unstructured" }));
    }

    #[test]
    fn test_outcome_accessors() {
        let filing = DiscoveredFiling::new("a-1", "10-K", "0000320193", "Apple Inc.");
        let extracted = ExtractionOutcome::Extracted(ExtractedRecord::from_filing(
            &filing,
            FormFields::default(),
            Utc::now(),
        ));
        assert!(extracted.is_extracted());
        assert_eq!(extracted.record().unwrap().company_name, "Apple Inc.");
        assert_eq!(extracted.label(), "extracted");

        let missing = ExtractionOutcome::NoExtractor { form: "8-K".to_string() };
        assert!(missing.is_no_extractor());
        assert!(missing.record().is_none());
    }
}
