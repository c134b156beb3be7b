//! Signal generation from extracted records.
//!
//! [`derive_signal`] is a pure function of a record, a policy and a timestamp.
//! [`SignalGenerator`] adds the in-memory accumulation the processor reports from.

mod policy;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{extraction::ExtractedRecord, signal::Signal};

pub use policy::{PassThroughPolicy, SignalPolicy, SignalScore};

/// Build a signal for `record` scored by `policy`.
pub fn derive_signal(record: &ExtractedRecord, policy: &dyn SignalPolicy, at: DateTime<Utc>) -> Signal {
    let score = policy.score(record);
    Signal {
        cik: record.cik.clone(),
        form: record.form.clone(),
        filing_date: record.filing_date,
        signal_type: score.signal_type,
        strength: score.strength,
        rationale: score.rationale,
        generated_at: at,
    }
}

/// Accumulates signals derived from extracted records.
pub struct SignalGenerator {
    policy: Arc<dyn SignalPolicy>,
    signals: Vec<Signal>,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(Arc::new(PassThroughPolicy))
    }
}

impl SignalGenerator {
    pub fn new(policy: Arc<dyn SignalPolicy>) -> Self {
        Self {
            policy,
            signals: Vec::new(),
        }
    }

    /// Derive a signal, keep it, and return a reference to it.
    pub fn process(&mut self, record: &ExtractedRecord) -> &Signal {
        let signal = derive_signal(record, self.policy.as_ref(), Utc::now());
        self.signals.push(signal);
        &self.signals[self.signals.len() - 1]
    }

    /// Signals generated so far, oldest first.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Drain the accumulated signals.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::extraction::FormFields;
    use crate::types::filing::DiscoveredFiling;
    use chrono::NaiveDate;

    fn record() -> ExtractedRecord {
        let filing = DiscoveredFiling::new("a-1", "10-K", "0000320193", "Apple Inc.")
            .with_filing_date(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        ExtractedRecord::from_filing(&filing, FormFields::Unstructured, Utc::now())
    }

    struct Bullish;

    impl SignalPolicy for Bullish {
        fn score(&self, _record: &ExtractedRecord) -> SignalScore {
            SignalScore {
                signal_type: Some("bullish".to_string()),
                strength: Some(0.8),
                rationale: Some("fixture".to_string()),
            }
        }
    }

    #[test]
    fn test_pass_through() {
        let at = Utc::now();
        let signal = derive_signal(&record(), &PassThroughPolicy, at);

        assert_eq!(signal.cik, "0000320193");
        assert_eq!(signal.form, "10-K");
        assert_eq!(signal.filing_date, NaiveDate::from_ymd_opt(2024, 2, 2));
        assert_eq!(signal.signal_type, None);
        assert_eq!(signal.strength, None);
        assert_eq!(signal.rationale, None);
        assert_eq!(signal.generated_at, at);
    }

    #[test]
    fn test_custom_policy() {
        let mut generator = SignalGenerator::new(Arc::new(Bullish));
        let signal = generator.process(&record());
        assert_eq!(signal.signal_type.as_deref(), Some("bullish"));
        assert_eq!(signal.strength, Some(0.8));
    }

    #[test]
    fn test_accumulation() {
        let mut generator = SignalGenerator::default();
        generator.process(&record());
        generator.process(&record());
        assert_eq!(generator.len(), 2);

        let taken = generator.take_signals();
        assert_eq!(taken.len(), 2);
        assert!(generator.is_empty());

        generator.process(&record());
        generator.clear();
        assert!(generator.signals().is_empty());
    }
}
