//! Stage handlers: what each kind of page yields
//!
//! Handlers are synchronous transformations of one fetched document into a
//! [`HandlerResult`]. They never touch the queue or the accumulator
//! themselves; the worker applies the result after the handler returns, so a
//! handler that fails halfway leaves nothing behind.

use crate::crawler::classifier::{check_body_errors, BodyCheck};
use crate::crawler::parser::{first_attr, first_text, Page};
use crate::crawler::{FetchResult, ItemRecord, Quantity, Site, Stage, Task, UNKNOWN_SENTINEL};
use crate::url::resolve;
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// What a single handler invocation produced
#[derive(Debug)]
pub enum HandlerResult {
    /// New tasks to enqueue (possibly none)
    Follow(Vec<Task>),
    /// One complete item record
    Record(ItemRecord),
    /// Expected data was missing; nothing produced
    Skip(SkipReason),
    /// Transient failure; the retry policy decides what happens next
    Retry(String),
    /// Response-level failure that retrying will not fix
    Fatal(String),
    /// The page did not have the shape the stage expects
    ParseError(ExtractError),
}

/// Why an item page produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownCountStatus(String),
    UnknownPriceStatus(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCountStatus(raw) => write!(f, "Unknown count status {:?}, skip", raw),
            Self::UnknownPriceStatus(raw) => write!(f, "Unknown price status {:?}, skip", raw),
        }
    }
}

/// Extraction failures, absorbed at the handler boundary
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("Empty field: {0}")]
    EmptyField(&'static str),
}

/// Runs the body-error check, then the handler for the task's stage
///
/// Links found on a page are resolved against the URL the page was served
/// from, after redirects.
pub fn run_handler(task: &Task, fetched: &FetchResult, site: &Site) -> HandlerResult {
    let (body, page_url) = match check_body_errors(fetched, &site.error_markers) {
        BodyCheck::Ok { body, final_url } => (body, final_url),
        BodyCheck::Transient(reason) => return HandlerResult::Retry(reason),
        BodyCheck::Fatal(reason) => return HandlerResult::Fatal(reason),
    };

    let page = Page::parse(body);

    let handled = match task.stage() {
        Stage::Initial => handle_initial(&page, site, page_url),
        Stage::ListingPage => handle_listing(&page, site, page_url),
        Stage::ItemPage => handle_item(&page, site, page_url),
    };

    handled.unwrap_or_else(HandlerResult::ParseError)
}

/// Catalog root: one listing task per catalog link
fn handle_initial(page: &Page, site: &Site, page_url: &Url) -> Result<HandlerResult, ExtractError> {
    let tasks = page
        .hrefs(&site.selectors.catalog_links)
        .iter()
        .filter_map(|href| resolve_link(page_url, href))
        .map(Task::listing)
        .collect();

    Ok(HandlerResult::Follow(tasks))
}

/// Listing page: sub-categories, then items, then at most one next page
fn handle_listing(page: &Page, site: &Site, page_url: &Url) -> Result<HandlerResult, ExtractError> {
    let selectors = &site.selectors;
    let mut tasks = Vec::new();

    for href in page.hrefs(&selectors.subcategory_links) {
        tasks.extend(resolve_link(page_url, &href).map(Task::listing));
    }

    for href in page.hrefs(&selectors.item_links) {
        tasks.extend(resolve_link(page_url, &href).map(Task::item));
    }

    if let Some(href) = next_page_href(page, site) {
        tasks.extend(resolve_link(page_url, &href).map(Task::listing));
    }

    Ok(HandlerResult::Follow(tasks))
}

fn next_page_href(page: &Page, site: &Site) -> Option<String> {
    page.root()
        .select(&site.selectors.pager_links)
        .find(|anchor| anchor.text().any(|t| t.contains(site.next_page_label.as_str())))
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Item page: exactly one record, or a skip
fn handle_item(page: &Page, site: &Site, page_url: &Url) -> Result<HandlerResult, ExtractError> {
    let selectors = &site.selectors;

    let name = page
        .text(&selectors.name)
        .ok_or(ExtractError::MissingElement("name"))?;
    if name.is_empty() {
        return Err(ExtractError::EmptyField("name"));
    }

    let block = page.first(&selectors.product_block);

    let availability = block
        .and_then(|b| first_text(b, &selectors.availability))
        .unwrap_or_default();
    let Some(block) = block.filter(|_| !availability.is_empty()) else {
        return Ok(HandlerResult::Skip(SkipReason::UnknownCountStatus(availability)));
    };

    let price_raw = first_text(block, &selectors.price).unwrap_or_default();
    let Some(price) = extract_price(&price_raw) else {
        return Ok(HandlerResult::Skip(SkipReason::UnknownPriceStatus(price_raw)));
    };

    let (sku, manufacturer) = read_properties(block, site);

    // A broken photo link is not worth losing the item over
    let photo_url = first_attr(block, &selectors.photo, "href")
        .and_then(|href| resolve(page_url, &href, &[]).ok());

    let mut properties = BTreeMap::new();
    properties.insert(
        site.description_label.clone(),
        first_text(block, &selectors.description).unwrap_or_default(),
    );

    Ok(HandlerResult::Record(ItemRecord {
        name,
        quantity: Quantity::Unknown,
        delivery: 0,
        unit: site.unit.clone(),
        price,
        sku,
        manufacturer,
        photo_url,
        properties,
    }))
}

/// Vendor code and manufacturer from the label/value property rows
fn read_properties(block: ElementRef<'_>, site: &Site) -> (String, String) {
    let selectors = &site.selectors;
    let mut sku = String::new();
    let mut manufacturer = String::new();

    for row in block.select(&selectors.property_rows) {
        let key = first_text(row, &selectors.property_key).unwrap_or_default();
        let value = first_text(row, &selectors.property_value).unwrap_or_default();

        if key.contains(site.manufacturer_label.as_str()) {
            manufacturer = value;
        } else if key.contains(site.sku_label.as_str()) {
            sku = value.trim_matches(|c| c == ' ' || c == '.').to_string();
        }
    }

    (sku, manufacturer)
}

const PRICE_PATTERN: &str = r"(?P<float>\d+(?:[.,]\d+)?)";

// A constant pattern; test_price_pattern_compiles pins it
static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PRICE_PATTERN).expect("price pattern is a valid regex"));

/// Pulls the decimal price out of display text such as `"1 250,50 руб."`
///
/// Returns `None` when no number is present. A zero price means "on
/// request" on the catalog and is stored as [`UNKNOWN_SENTINEL`].
pub fn extract_price(raw: &str) -> Option<String> {
    let compact: String = raw.split_whitespace().collect();
    let captures = PRICE.captures(&compact)?;
    let price = captures.name("float")?.as_str().replace(',', ".");

    match price.parse::<f64>() {
        Ok(value) if value == 0.0 => Some(UNKNOWN_SENTINEL.to_string()),
        _ => Some(price),
    }
}

/// Resolves one href found on a page; an unusable link is logged and dropped
/// so the rest of the page still counts
fn resolve_link(page_url: &Url, href: &str) -> Option<Url> {
    match resolve(page_url, href, &[]) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Skipping link {:?} on {}: {}", href, page_url, e);
            None
        }
    }
}
