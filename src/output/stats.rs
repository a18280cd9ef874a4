//! Run summary built from the outcome counters
//!
//! This module turns the per-outcome completion counts of a finished crawl
//! into the summary printed at the end of a run.

use crate::state::Outcome;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Outcome counts of a finished crawl, largest first
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// `(outcome, count)` sorted by count descending, ties in outcome order
    pub counts: Vec<(Outcome, u64)>,

    /// Total task completions
    pub total: u64,

    pub records: usize,

    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(outcomes: &BTreeMap<Outcome, u64>, records: usize, elapsed: Duration) -> Self {
        let mut counts: Vec<_> = outcomes
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(outcome, count)| (*outcome, *count))
            .collect();
        // Stable sort keeps the BTreeMap order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total: counts.iter().map(|(_, count)| count).sum(),
            counts,
            records,
            elapsed,
        }
    }

    /// Share of all completions that ended with `outcome`, in percent
    pub fn percentage(&self, outcome: Outcome) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let count = self
            .counts
            .iter()
            .find(|(o, _)| *o == outcome)
            .map_or(0, |(_, count)| *count);

        count as f64 / self.total as f64 * 100.0
    }

    /// Completions counted as fatal or parse errors
    pub fn errors(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(outcome, _)| outcome.is_error())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Formats the summary as printed at the end of a run
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Records collected: {}", summary.records);
    let _ = writeln!(out, "Tasks completed: {}", summary.total);
    let _ = writeln!(out, "Errors: {}", summary.errors());
    let _ = writeln!(out, "Duration: {:.1}s", summary.elapsed.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "Outcomes:");
    for (outcome, count) in &summary.counts {
        let _ = writeln!(
            out,
            "  Code: {}, count: {:.2}% ({} / {})",
            outcome,
            summary.percentage(*outcome),
            count,
            summary.total
        );
    }

    out
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}
