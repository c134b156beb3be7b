//! Signals derived from extracted records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub cik: String,
    pub form: String,
    pub filing_date: Option<NaiveDate>,

    /// Unset until a scoring policy assigns one.
    pub signal_type: Option<String>,
    pub strength: Option<f64>,
    pub rationale: Option<String>,

    pub generated_at: DateTime<Utc>,
}
