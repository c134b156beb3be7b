//! Discovery and processing stages.

pub mod backfill;
pub mod discovery;
pub mod poller;
pub mod processor;

pub use backfill::{business_days_back, business_days_between, is_business_day, BackfillReport};
pub use discovery::{discover, DiscoveryOutcome};
pub use poller::{CycleReport, PollStream, Poller};
pub use processor::{EntryReport, FilingProcessor, PassReport};
