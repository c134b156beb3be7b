//! Configuration types for polling and processing.

use std::str::FromStr;
use std::time::Duration;

use uuid::Uuid;

use crate::error::PipelineError;

/// Pagination bounds for walking one day of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBounds {
    /// Hits per full page. A shorter page is the last page.
    pub page_size: u32,

    /// Safety bound against a server that never runs out of pages.
    pub max_pages: u32,

    /// Pause between page requests.
    pub page_delay: Duration,
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 20,
            page_delay: Duration::from_millis(100),
        }
    }
}

impl PageBounds {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size,
            max_pages,
            ..Default::default()
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

/// Configuration for the live and backfill poll loops.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Form types to request. Empty means all forms.
    pub forms: Vec<String>,

    /// Bounds for each live cycle.
    pub live: PageBounds,

    /// Bounds for each backfilled day.
    pub backfill: PageBounds,

    /// Live cadence, measured from the start of the previous cycle.
    ///
    /// Default: 60 seconds.
    pub poll_interval: Duration,

    /// Maximum random offset added to or removed from the cadence.
    ///
    /// Default: none.
    pub jitter: Duration,

    /// Pause between backfilled days.
    ///
    /// Default: 1 second.
    pub day_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            forms: Vec::new(),
            live: PageBounds::default(),
            backfill: PageBounds::default(),
            poll_interval: Duration::from_secs(60),
            jitter: Duration::ZERO,
            day_delay: Duration::from_secs(1),
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forms(mut self, forms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.forms = forms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_live_bounds(mut self, bounds: PageBounds) -> Self {
        self.live = bounds;
        self
    }

    pub fn with_backfill_bounds(mut self, bounds: PageBounds) -> Self {
        self.backfill = bounds;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_day_delay(mut self, delay: Duration) -> Self {
        self.day_delay = delay;
        self
    }

    /// Zero every delay (tests and one-shot tooling).
    pub fn without_delays(mut self) -> Self {
        self.live.page_delay = Duration::ZERO;
        self.backfill.page_delay = Duration::ZERO;
        self.poll_interval = Duration::ZERO;
        self.jitter = Duration::ZERO;
        self.day_delay = Duration::ZERO;
        self
    }
}

/// What to do with a queue entry whose extraction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Mark processed regardless of outcome. Failures are never retried.
    #[default]
    MarkProcessed,

    /// Leave failed entries pending until they have failed `max_attempts` times.
    Retry { max_attempts: u32 },
}

impl FromStr for FailurePolicy {
    type Err = PipelineError;

    /// Accepts `mark-processed` or `retry:<attempts>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("mark-processed") || s.eq_ignore_ascii_case("mark") {
            return Ok(FailurePolicy::MarkProcessed);
        }

        if let Some(n) = s.strip_prefix("retry:") {
            let max_attempts: u32 = n
                .parse()
                .map_err(|_| PipelineError::Config(format!("invalid retry attempts: {n}")))?;
            if max_attempts == 0 {
                return Err(PipelineError::Config(
                    "retry attempts must be > 0".to_string(),
                ));
            }
            return Ok(FailurePolicy::Retry { max_attempts });
        }

        Err(PipelineError::Config(format!("unknown failure policy: {s}")))
    }
}

/// Configuration for the processing loop.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub failure_policy: FailurePolicy,

    /// Pause between passes over the queue.
    pub poll_interval: Duration,

    /// Identifies this processor in logs.
    pub worker_id: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            poll_interval: Duration::from_secs(30),
            worker_id: format!("processor-{}", Uuid::new_v4()),
        }
    }
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(
            "mark-processed".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::MarkProcessed
        );
        assert_eq!(
            "retry:3".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Retry { max_attempts: 3 }
        );
        assert!("retry:0".parse::<FailurePolicy>().is_err());
        assert!("retry:x".parse::<FailurePolicy>().is_err());
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.live.page_size, 100);
        assert_eq!(config.backfill.max_pages, 20);
        assert_eq!(config.poll_interval, Duration::from_secs(60));

        let processor = ProcessorConfig::default();
        assert_eq!(processor.failure_policy, FailurePolicy::MarkProcessed);
        assert!(processor.worker_id.starts_with("processor-"));
    }
}
