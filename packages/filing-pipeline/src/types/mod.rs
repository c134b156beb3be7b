//! Data types for filings, queue entries, extracted records and signals.

pub mod config;
pub mod extraction;
pub mod filing;
pub mod queue;
pub mod signal;
