//! Backfill over a range of business days.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::poller::{CycleReport, Poller};
use crate::traits::{search::SearchIndex, store::FilingStore};

/// Monday to Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days among the `days` calendar days before `today`, oldest first.
///
/// `today` itself is not included.
pub fn business_days_back(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = (1..=u64::from(days))
        .filter_map(|i| today.checked_sub_days(Days::new(i)))
        .filter(|d| is_business_day(*d))
        .collect();
    dates.sort_unstable();
    dates
}

/// Business days in the inclusive range `start..=end`, oldest first.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// Per-day reports from one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub days: Vec<CycleReport>,

    /// Set when the run stopped before the last date.
    pub cancelled: bool,
}

impl BackfillReport {
    pub fn pages(&self) -> u32 {
        self.days.iter().map(|d| d.pages).sum()
    }

    pub fn hits(&self) -> usize {
        self.days.iter().map(|d| d.hits).sum()
    }

    pub fn new_filings(&self) -> usize {
        self.days.iter().map(|d| d.new).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.days.iter().map(|d| d.duplicate).sum()
    }

    pub fn malformed(&self) -> usize {
        self.days.iter().map(|d| d.malformed).sum()
    }

    /// Dates that ended early.
    pub fn incomplete_days(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|d| !d.is_complete())
            .map(|d| d.date)
            .collect()
    }
}

impl<I, S> Poller<I, S>
where
    I: SearchIndex,
    S: FilingStore + ?Sized,
{
    /// Poll each date in order using the backfill page bounds.
    ///
    /// A store failure ends that date only; the run moves on to the next one.
    pub async fn run_backfill(&self, dates: &[NaiveDate], shutdown: &CancellationToken) -> BackfillReport {
        let config = self.config();
        let mut report = BackfillReport::default();

        info!(
            days = dates.len(),
            first = ?dates.first(),
            last = ?dates.last(),
            "backfill starting"
        );

        for (i, date) in dates.iter().copied().enumerate() {
            if shutdown.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let day = match self.poll_date(date, &config.backfill).await {
                Ok(day) => day,
                Err(e) => {
                    error!(%date, error = %e, "backfill day failed");
                    let mut day = CycleReport::new(date);
                    day.aborted = Some(e.to_string());
                    day
                }
            };

            info!(
                %date,
                pages = day.pages,
                hits = day.hits,
                new = day.new,
                duplicate = day.duplicate,
                "backfill day finished"
            );
            report.days.push(day);

            if i + 1 < dates.len() && !config.day_delay.is_zero() {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(config.day_delay) => {}
                }
            }
        }

        info!(
            days = report.days.len(),
            new = report.new_filings(),
            duplicate = report.duplicates(),
            incomplete = report.incomplete_days().len(),
            "backfill finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::stores::MemoryStore;
    use crate::testing::{hit, MockSearchIndex};
    use crate::types::config::PollerConfig;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_business_days_back() {
        // Mon 2024-03-04 through Wed 2024-03-13 contains one weekend
        let dates = business_days_back(ymd(2024, 3, 14), 10);

        assert_eq!(dates.len(), 8);
        assert_eq!(dates.first(), Some(&ymd(2024, 3, 4)));
        assert_eq!(dates.last(), Some(&ymd(2024, 3, 13)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert!(!dates.contains(&ymd(2024, 3, 9)));
        assert!(!dates.contains(&ymd(2024, 3, 10)));
    }

    #[test]
    fn test_business_days_back_zero() {
        assert!(business_days_back(ymd(2024, 3, 14), 0).is_empty());
    }

    #[test]
    fn test_business_days_between() {
        let dates = business_days_between(ymd(2024, 3, 8), ymd(2024, 3, 11));
        assert_eq!(dates, vec![ymd(2024, 3, 8), ymd(2024, 3, 11)]);

        assert!(business_days_between(ymd(2024, 3, 11), ymd(2024, 3, 8)).is_empty());
    }

    #[tokio::test]
    async fn test_backfill_walks_each_day() {
        let index = MockSearchIndex::new()
            .with_page(vec![hit("d1-a", "10-K", "0000320193"), hit("d1-b", "4", "0000320193")])
            .with_page(vec![hit("d2-a", "8-K", "0000789019")]);

        let poller = Poller::new(index, Arc::new(MemoryStore::new()))
            .with_config(PollerConfig::default().without_delays());

        let dates = business_days_between(ymd(2024, 3, 7), ymd(2024, 3, 8));
        let report = poller.run_backfill(&dates, &CancellationToken::new()).await;

        assert_eq!(report.days.len(), 2);
        assert_eq!(report.new_filings(), 3);
        assert!(report.incomplete_days().is_empty());
        assert!(!report.cancelled);

        let calls = poller.index().calls();
        assert_eq!(calls[0].start, ymd(2024, 3, 7));
        assert_eq!(calls[1].start, ymd(2024, 3, 8));
    }

    #[tokio::test]
    async fn test_backfill_cancelled() {
        let poller = Poller::new(MockSearchIndex::new(), Arc::new(MemoryStore::new()))
            .with_config(PollerConfig::default().without_delays());

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let report = poller
            .run_backfill(&[ymd(2024, 3, 7), ymd(2024, 3, 8)], &shutdown)
            .await;
        assert!(report.days.is_empty());
        assert!(report.cancelled);
    }

    #[tokio::test]
    async fn test_backfill_continues_after_fetch_failure() {
        let index = MockSearchIndex::new()
            .with_failure(503, "busy")
            .with_page(vec![hit("d2-a", "4", "0000320193")]);
        let poller = Poller::new(index, Arc::new(MemoryStore::new()))
            .with_config(PollerConfig::default().without_delays());

        let dates = [ymd(2024, 3, 7), ymd(2024, 3, 8)];
        let report = poller.run_backfill(&dates, &CancellationToken::new()).await;

        assert_eq!(report.incomplete_days(), vec![ymd(2024, 3, 7)]);
        assert_eq!(report.new_filings(), 1);
    }
}
