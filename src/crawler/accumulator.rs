use crate::crawler::ItemRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only sink for item records, shared by all workers
///
/// Records land in completion order, which is nondeterministic under
/// concurrency. Nothing is deduplicated. The lock is only held for the push
/// itself, never across a fetch.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    records: Mutex<Vec<ItemRecord>>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ItemRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every record collected so far
    ///
    /// Meant for after the crawl: calling it while workers still push
    /// splits the records between this call and the next.
    pub fn drain(&self) -> Vec<ItemRecord> {
        std::mem::take(&mut *self.lock())
    }

    // A panicking worker never leaves a half-pushed Vec behind, so the data
    // behind a poisoned lock is still whole.
    fn lock(&self) -> MutexGuard<'_, Vec<ItemRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
