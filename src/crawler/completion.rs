use crate::crawler::{Scheduler, Task};
use crate::state::{Outcome, OutcomeCounters};
use std::sync::Arc;

/// Reports a task's final outcome exactly once, whatever path the worker takes
///
/// The outcome is recorded and the scheduler told about the completion when
/// the guard is dropped. A guard dropped without [`CompletionGuard::finish`]
/// (a panic in the fetcher or a handler) counts as a parse error.
pub struct CompletionGuard {
    scheduler: Arc<Scheduler>,
    counters: Arc<OutcomeCounters>,
    terminal: bool,
    outcome: Option<Outcome>,
}

impl CompletionGuard {
    pub fn new(scheduler: Arc<Scheduler>, counters: Arc<OutcomeCounters>, task: &Task) -> Self {
        Self {
            scheduler,
            counters,
            terminal: task.is_terminal(),
            outcome: None,
        }
    }

    /// Sets the outcome and completes the task
    pub fn finish(mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or_else(|| {
            tracing::error!("Task ended without an outcome");
            Outcome::ParseError
        });

        self.counters.record(outcome);

        // A requeued attempt does not end its branch yet
        self.scheduler
            .complete(self.terminal && outcome != Outcome::Retry);
    }
}
