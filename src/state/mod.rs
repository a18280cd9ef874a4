//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Outcome`: the final status of one task delivery (ok, retry, fatal, ...)
//! - `OutcomeCounters`: lock-free per-outcome counters shared by all workers

mod counters;
mod outcome;

// Re-export main types
pub use counters::OutcomeCounters;
pub use outcome::Outcome;
