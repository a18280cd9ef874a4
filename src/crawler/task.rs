//! Crawl tasks and the stages they are bound to

use std::fmt;
use url::Url;

/// Priority of the bootstrap task
pub const INITIAL_PRIORITY: i32 = 100;

/// Priority of listing, sub-category and next-page tasks
pub const LISTING_PRIORITY: i32 = 90;

/// Priority of item detail tasks; items drain before new listings open up
pub const ITEM_PRIORITY: i32 = 100;

/// The handler stage a task is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Catalog root: discovers top-level listings
    Initial,
    /// A (sub)listing page: sub-categories, items and pagination
    ListingPage,
    /// A single product detail page
    ItemPage,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ListingPage => "listing_page",
            Self::ItemPage => "item_page",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of scheduled crawl work
///
/// Tasks are immutable once built. A retry is a new task produced by the
/// scheduler with the attempt count bumped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    target: Url,
    stage: Stage,
    priority: i32,
    terminal: bool,
    attempt: u32,
}

impl Task {
    pub fn new(stage: Stage, target: Url, priority: i32) -> Self {
        Self {
            target,
            stage,
            priority,
            terminal: false,
            attempt: 0,
        }
    }

    /// Bootstrap task for the catalog root
    pub fn initial(target: Url) -> Self {
        Self::new(Stage::Initial, target, INITIAL_PRIORITY)
    }

    /// Listing, sub-category or next-page task
    pub fn listing(target: Url) -> Self {
        Self::new(Stage::ListingPage, target, LISTING_PRIORITY)
    }

    /// Item detail task; always ends its branch
    pub fn item(target: Url) -> Self {
        Self::new(Stage::ItemPage, target, ITEM_PRIORITY).into_terminal()
    }

    /// Marks this task as the last one on its branch
    pub fn into_terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Deliveries already made before this one (0 for a fresh task)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Copy of this task for the next delivery
    pub(crate) fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://shop.example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_constructors_set_priority_and_terminal() {
        let listing = Task::listing(url("/list/"));
        assert_eq!(listing.stage(), Stage::ListingPage);
        assert_eq!(listing.priority(), LISTING_PRIORITY);
        assert!(!listing.is_terminal());

        let item = Task::item(url("/item/1/"));
        assert_eq!(item.stage(), Stage::ItemPage);
        assert_eq!(item.priority(), ITEM_PRIORITY);
        assert!(item.is_terminal());

        let initial = Task::initial(url("/"));
        assert_eq!(initial.stage(), Stage::Initial);
        assert!(!initial.is_terminal());
    }

    #[test]
    fn test_fresh_task_has_no_attempts() {
        assert_eq!(Task::listing(url("/list/")).attempt(), 0);
    }

    #[test]
    fn test_next_attempt_keeps_everything_else() {
        let task = Task::item(url("/item/1/"));
        let retry = task.next_attempt().next_attempt();

        assert_eq!(retry.attempt(), 2);
        assert_eq!(retry.target(), task.target());
        assert_eq!(retry.stage(), task.stage());
        assert_eq!(retry.priority(), task.priority());
        assert!(retry.is_terminal());
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Initial.to_string(), "initial");
        assert_eq!(Stage::ListingPage.to_string(), "listing_page");
        assert_eq!(Stage::ItemPage.to_string(), "item_page");
    }
}
