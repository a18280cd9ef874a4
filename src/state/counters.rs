use crate::state::Outcome;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-outcome completion counters shared by all workers
///
/// Increment-only while the crawl runs; read once at the end through
/// [`OutcomeCounters::snapshot`].
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    slots: [AtomicU64; Outcome::COUNT],
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one task completion
    pub fn record(&self, outcome: Outcome) {
        self.slots[outcome.slot()].fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current count for one outcome
    pub fn get(&self, outcome: Outcome) -> u64 {
        self.slots[outcome.slot()].load(Ordering::Relaxed)
    }

    /// Total completions across all outcomes
    pub fn total(&self) -> u64 {
        Outcome::ALL.iter().map(|o| self.get(*o)).sum()
    }

    /// Copies the non-zero counters into a map
    pub fn snapshot(&self) -> BTreeMap<Outcome, u64> {
        Outcome::ALL
            .iter()
            .map(|o| (*o, self.get(*o)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
