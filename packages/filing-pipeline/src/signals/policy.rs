//! Signal scoring policies.

use crate::types::extraction::ExtractedRecord;

/// Score assigned to an extracted record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalScore {
    pub signal_type: Option<String>,
    pub strength: Option<f64>,
    pub rationale: Option<String>,
}

/// Decides the kind, strength and rationale of a signal.
pub trait SignalPolicy: Send + Sync {
    fn score(&self, record: &ExtractedRecord) -> SignalScore;
}

/// Copies base fields through and leaves the score unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughPolicy;

impl SignalPolicy for PassThroughPolicy {
    fn score(&self, _record: &ExtractedRecord) -> SignalScore {
        SignalScore::default()
    }
}
