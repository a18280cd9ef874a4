//! Crawler module: the task-driven crawl engine
//!
//! This module contains the core crawling logic, including:
//! - Tasks and the three stages they are routed to
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Response classification and the retry policy
//! - Stage handlers that turn pages into new tasks or item records
//! - Task scheduling and overall crawl coordination

mod accumulator;
mod classifier;
mod completion;
mod coordinator;
mod fetcher;
mod handlers;
mod parser;
mod record;
mod scheduler;
mod site;
mod task;

pub use accumulator::ResultAccumulator;
pub use classifier::{check_body_errors, BodyCheck, RetryPolicy};
pub use completion::CompletionGuard;
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher, NetworkErrorKind};
pub use handlers::{extract_price, run_handler, ExtractError, HandlerResult, SkipReason};
pub use parser::Page;
pub use record::{ItemRecord, Quantity, UNKNOWN_SENTINEL};
pub use scheduler::{ScheduledTask, Scheduler};
pub use site::{Site, SiteSelectors};
pub use task::{Stage, Task, INITIAL_PRIORITY, ITEM_PRIORITY, LISTING_PRIORITY};
