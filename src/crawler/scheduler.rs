//! Scheduler for the crawl task queue
//!
//! This module handles:
//! - Priority queue management for pending tasks
//! - Worker slot limiting via a semaphore
//! - Requeueing transiently failed tasks under the retry policy
//! - Deciding when the crawl is finished (queue empty, nothing in flight)

use crate::crawler::{RetryPolicy, Stage, Task};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// A task waiting in the frontier
#[derive(Debug)]
struct QueuedTask {
    task: Task,

    /// Insertion order, used to keep equal priorities FIFO
    seq: u64,
}

// Higher priority pops first from the max-heap; among equals the lower
// sequence number (older task) wins.
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .priority()
            .cmp(&other.task.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

/// A task handed to a worker, together with its worker slot
///
/// The slot is released when this value (or the permit moved out of it) is
/// dropped.
pub struct ScheduledTask {
    pub task: Task,
    pub permit: OwnedSemaphorePermit,
}

#[derive(Debug, Default)]
struct QueueState {
    frontier: BinaryHeap<QueuedTask>,
    seen: HashSet<(Stage, String)>,
    in_flight: usize,
    next_seq: u64,
    branches_completed: u64,
}

impl QueueState {
    fn push(&mut self, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(QueuedTask { task, seq });
    }
}

/// Scheduler owns the frontier and the worker slots
///
/// Every method takes `&self`; the scheduler is shared between the dispatch
/// loop and all workers behind an `Arc`. The internal lock is never held
/// across an `.await`.
pub struct Scheduler {
    state: Mutex<QueueState>,

    /// Woken whenever the frontier grows or a task completes
    wakeup: Notify,

    /// One permit per worker slot
    slots: Arc<Semaphore>,

    policy: RetryPolicy,

    dedupe_targets: bool,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `thread_count` - Number of tasks allowed to run at once
    /// * `policy` - Retry policy applied by [`Scheduler::requeue`]
    /// * `dedupe_targets` - Drop fresh tasks whose `(stage, target)` was already accepted
    pub fn new(thread_count: usize, policy: RetryPolicy, dedupe_targets: bool) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            wakeup: Notify::new(),
            slots: Arc::new(Semaphore::new(thread_count.max(1))),
            policy,
            dedupe_targets,
        }
    }

    /// Accepts a fresh task into the frontier
    ///
    /// Returns `false` when the task was dropped as a duplicate.
    pub fn enqueue(&self, task: Task) -> bool {
        {
            let mut state = self.lock();

            if self.dedupe_targets {
                let key = (task.stage(), task.target().as_str().to_string());
                if !state.seen.insert(key) {
                    tracing::debug!("Already queued: {} {}", task.stage(), task.target());
                    return false;
                }
            }

            state.push(task);
        }

        self.wakeup.notify_waiters();
        true
    }

    /// Puts a transiently failed task back with its attempt count bumped
    ///
    /// Returns `false` when the retry policy says the task has used up its
    /// tries; the caller then reports it as fatal. Retries skip the visited
    /// set.
    pub fn requeue(&self, task: &Task) -> bool {
        if !self.policy.allows_retry(task) {
            return false;
        }

        self.lock().push(task.next_attempt());
        self.wakeup.notify_waiters();
        true
    }

    /// Waits for the next task to run
    ///
    /// This method:
    /// 1. Waits for a free worker slot
    /// 2. Pops the highest priority task if one is queued
    /// 3. Otherwise waits for new tasks while any task is still in flight
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledTask)` - A task and its worker slot
    /// * `None` - The frontier is empty and nothing is in flight: the crawl is over
    pub async fn next_task(&self) -> Option<ScheduledTask> {
        let permit = Arc::clone(&self.slots).acquire_owned().await.ok()?;

        loop {
            // Register interest before looking, so a wakeup between the
            // check and the await is not lost
            let notified = self.wakeup.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();

                if let Some(queued) = state.frontier.pop() {
                    state.in_flight += 1;
                    return Some(ScheduledTask {
                        task: queued.task,
                        permit,
                    });
                }

                if state.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one delivered task as finished
    ///
    /// Follow-up tasks and requeues must be submitted before this call, or
    /// the dispatch loop may see an empty, idle queue and stop early.
    pub fn complete(&self, branch_done: bool) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if branch_done {
                state.branches_completed += 1;
            }
        }

        self.wakeup.notify_waiters();
    }

    pub fn frontier_size(&self) -> usize {
        self.lock().frontier.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Terminal tasks that reached a final outcome
    pub fn branches_completed(&self) -> u64 {
        self.lock().branches_completed
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ITEM_PRIORITY, LISTING_PRIORITY};
    use std::time::Duration;
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse("https://shop.example.com/").unwrap().join(path).unwrap()
    }

    fn scheduler(dedupe: bool) -> Scheduler {
        Scheduler::new(4, RetryPolicy::new(3), dedupe)
    }

    #[tokio::test]
    async fn test_priority_then_fifo() {
        let scheduler = scheduler(true);
        scheduler.enqueue(Task::listing(url("/l/1/")));
        scheduler.enqueue(Task::item(url("/i/1/")));
        scheduler.enqueue(Task::listing(url("/l/2/")));
        scheduler.enqueue(Task::item(url("/i/2/")));

        let mut order = Vec::new();
        while let Some(scheduled) = scheduler.next_task().await {
            order.push(scheduled.task.target().path().to_string());
            scheduler.complete(scheduled.task.is_terminal());
        }

        assert_eq!(order, vec!["/i/1/", "/i/2/", "/l/1/", "/l/2/"]);
        assert_eq!(scheduler.branches_completed(), 2);
        assert!(ITEM_PRIORITY > LISTING_PRIORITY);
    }

    #[tokio::test]
    async fn test_dedupe_by_stage_and_target() {
        let scheduler = scheduler(true);
        assert!(scheduler.enqueue(Task::listing(url("/l/1/"))));
        assert!(!scheduler.enqueue(Task::listing(url("/l/1/"))));
        // Same address under another stage is a different key
        assert!(scheduler.enqueue(Task::item(url("/l/1/"))));
        assert_eq!(scheduler.frontier_size(), 2);
    }

    #[tokio::test]
    async fn test_dedupe_disabled() {
        let scheduler = scheduler(false);
        assert!(scheduler.enqueue(Task::listing(url("/l/1/"))));
        assert!(scheduler.enqueue(Task::listing(url("/l/1/"))));
        assert_eq!(scheduler.frontier_size(), 2);
    }

    #[tokio::test]
    async fn test_requeue_respects_policy() {
        let scheduler = scheduler(true);
        scheduler.enqueue(Task::listing(url("/l/1/")));

        let mut deliveries = 0;
        while let Some(scheduled) = scheduler.next_task().await {
            deliveries += 1;
            let requeued = scheduler.requeue(&scheduled.task);
            assert_eq!(requeued, deliveries < 3);
            scheduler.complete(false);
        }

        assert_eq!(deliveries, 3);
    }

    #[tokio::test]
    async fn test_empty_scheduler_finishes_immediately() {
        assert!(scheduler(true).next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_waits_for_in_flight_work() {
        let scheduler = Arc::new(scheduler(true));
        scheduler.enqueue(Task::listing(url("/l/1/")));

        let first = scheduler.next_task().await.unwrap();
        assert_eq!(scheduler.in_flight(), 1);

        let worker = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                scheduler.enqueue(Task::item(url("/i/1/")));
                scheduler.complete(false);
                drop(first);
            })
        };

        // Frontier is empty but a task is in flight: must wait, not finish
        let second = scheduler.next_task().await.unwrap();
        assert_eq!(second.task.target().path(), "/i/1/");
        scheduler.complete(true);

        worker.await.unwrap();
        assert!(scheduler.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_slots_limit_concurrency() {
        let scheduler = Scheduler::new(1, RetryPolicy::new(1), true);
        scheduler.enqueue(Task::item(url("/i/1/")));
        scheduler.enqueue(Task::item(url("/i/2/")));

        let first = scheduler.next_task().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(50), scheduler.next_task()).await;
        assert!(blocked.is_err());

        scheduler.complete(true);
        drop(first);
        assert!(scheduler.next_task().await.is_some());
    }
}
