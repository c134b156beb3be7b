//! Core trait abstractions for the filing pipeline.
//!
//! These traits define the seams the pipeline is assembled from: the search
//! index it polls, the store it deduplicates and queues into, the extractors
//! it dispatches to and the sink that receives signals.

pub mod extractor;
pub mod search;
pub mod sink;
pub mod store;
