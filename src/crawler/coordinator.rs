//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the dispatch loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the queue with the catalog root
//! - Handing tasks to workers as slots free up
//! - Applying each handler result to the queue, accumulator and counters
//! - Building the final crawl report

use crate::config::Config;
use crate::crawler::completion::CompletionGuard;
use crate::crawler::handlers::{run_handler, HandlerResult};
use crate::crawler::{
    Fetcher, HttpFetcher, ItemRecord, ResultAccumulator, RetryPolicy, ScheduledTask, Scheduler,
    Site, Task,
};
use crate::state::{Outcome, OutcomeCounters};
use crate::url::normalize_target;
use crate::{SpiderError, UrlError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use url::Url;

/// What a finished crawl produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Item records in completion order
    pub records: Vec<ItemRecord>,

    /// Task completions per outcome (zero counts omitted)
    pub outcomes: BTreeMap<Outcome, u64>,

    /// Terminal tasks that reached a final outcome
    pub branches_completed: u64,

    pub elapsed: Duration,
}

impl CrawlReport {
    /// Total number of task completions
    pub fn tasks_completed(&self) -> u64 {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    start: Url,
    worker: Worker,
}

/// Shared state every spawned task needs
#[derive(Clone)]
struct Worker {
    site: Arc<Site>,
    fetcher: Arc<dyn Fetcher>,
    scheduler: Arc<Scheduler>,
    counters: Arc<OutcomeCounters>,
    accumulator: Arc<ResultAccumulator>,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SpiderError)` - Bad start URL, selector, or HTTP client setup
    pub fn new(config: Config) -> Result<Self, SpiderError> {
        let fetcher = HttpFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout),
        )?;

        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator over any [`Fetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, SpiderError> {
        let start = Url::parse(&config.crawler.start_url)
            .map_err(|e| UrlError::Parse(format!("{}: {}", config.crawler.start_url, e)))?;
        let start = normalize_target(start)?;

        let site = Site::new(&config.site)?;

        let scheduler = Scheduler::new(
            config.crawler.thread_count as usize,
            RetryPolicy::new(config.crawler.try_limit),
            config.crawler.dedupe_targets,
        );

        Ok(Self {
            worker: Worker {
                site: Arc::new(site),
                fetcher,
                scheduler: Arc::new(scheduler),
                counters: Arc::new(OutcomeCounters::new()),
                accumulator: Arc::new(ResultAccumulator::new()),
            },
            start,
        })
    }

    /// Runs the crawl to completion
    ///
    /// This is the core dispatch loop that:
    /// 1. Seeds the queue with the `Initial` task
    /// 2. Takes tasks from the scheduler as worker slots free up
    /// 3. Spawns one tokio task per delivery
    /// 4. Stops when the queue is empty and no task is in flight
    ///
    /// Per-task failures never make this return an error; they end up in
    /// [`CrawlReport::outcomes`].
    pub async fn run(self) -> crate::Result<CrawlReport> {
        let Self { start, worker } = self;
        let scheduler = Arc::clone(&worker.scheduler);

        tracing::info!(
            "Starting crawl at {} (try limit {})",
            start,
            scheduler.policy().try_limit()
        );

        let start_time = Instant::now();
        scheduler.enqueue(Task::initial(start));

        let mut dispatched: u64 = 0;

        while let Some(scheduled) = scheduler.next_task().await {
            let span = tracing::info_span!(
                "task",
                stage = %scheduled.task.stage(),
                url = %scheduled.task.target(),
                attempt = scheduled.task.attempt(),
            );

            tokio::spawn(worker.clone().process(scheduled).instrument(span));

            dispatched += 1;

            if dispatched % 10 == 0 {
                let elapsed = start_time.elapsed();
                let completed = worker.counters.total();
                tracing::info!(
                    "Progress: {} tasks completed, {} queued, {} in flight, {} records, {:.2} tasks/sec",
                    completed,
                    scheduler.frontier_size(),
                    scheduler.in_flight(),
                    worker.accumulator.len(),
                    completed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }

        let report = CrawlReport {
            records: worker.accumulator.drain(),
            outcomes: worker.counters.snapshot(),
            branches_completed: scheduler.branches_completed(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} tasks, {} records in {:?}",
            report.tasks_completed(),
            report.records.len(),
            report.elapsed
        );

        Ok(report)
    }
}

impl Worker {
    /// Runs one delivery of a task: fetch, handle, apply
    async fn process(self, scheduled: ScheduledTask) {
        let ScheduledTask { task, permit: _permit } = scheduled;

        let guard = CompletionGuard::new(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.counters),
            &task,
        );

        let fetched = self.fetcher.fetch(task.target()).await;
        let result = run_handler(&task, &fetched, &self.site);
        let outcome = self.apply(&task, result);

        guard.finish(outcome);
    }

    /// Applies a handler result and returns the outcome to count
    ///
    /// Must run before the task is completed: new tasks and requeues have to
    /// be in the frontier while this task still counts as in flight.
    fn apply(&self, task: &Task, result: HandlerResult) -> Outcome {
        match result {
            HandlerResult::Follow(tasks) => {
                let found = tasks.len();
                let accepted = tasks
                    .into_iter()
                    .map(|t| self.scheduler.enqueue(t))
                    .filter(|accepted| *accepted)
                    .count();
                tracing::debug!("Found {} links, {} new", found, accepted);
                Outcome::Ok
            }

            HandlerResult::Record(record) => {
                tracing::info!("Add: {} ({})", record.name, record.price);
                self.accumulator.push(record);
                Outcome::Ok
            }

            HandlerResult::Skip(reason) => {
                tracing::warn!("{}", reason);
                Outcome::Skipped
            }

            HandlerResult::Retry(reason) => {
                if self.scheduler.requeue(task) {
                    tracing::warn!("Transient failure, requeued: {}", reason);
                    Outcome::Retry
                } else {
                    tracing::error!(
                        "Giving up after {} attempts: {}",
                        task.attempt() + 1,
                        reason
                    );
                    Outcome::Fatal
                }
            }

            HandlerResult::Fatal(reason) => {
                tracing::error!("Fatal: {}", reason);
                Outcome::Fatal
            }

            HandlerResult::ParseError(e) => {
                tracing::error!("Parse error: {}", e);
                Outcome::ParseError
            }
        }
    }
}

/// Runs a complete crawl over HTTP
///
/// # Example
///
/// ```no_run
/// use catalog_spider::config::load_config;
/// use catalog_spider::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> crate::Result<CrawlReport> {
    Coordinator::new(config)?.run().await
}
