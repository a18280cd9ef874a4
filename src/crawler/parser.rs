//! HTML document access for stage handlers
//!
//! This module wraps `scraper` with the few queries the handlers need:
//! - collecting link targets from anchors
//! - reading the first matching element's text or attribute, with defaulting

use scraper::{ElementRef, Html, Selector};

/// A fetched page, parsed once and queried by the stage handlers
pub struct Page {
    document: Html,
}

impl Page {
    /// Parses HTML content into a queryable page
    ///
    /// Parsing never fails: malformed markup is repaired the way browsers
    /// do it, and missing elements surface later as empty selections.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_spider::crawler::Page;
    /// use scraper::Selector;
    ///
    /// let page = Page::parse(r#"<html><body><h1> Drill </h1></body></html>"#);
    /// let h1 = Selector::parse("h1").unwrap();
    /// assert_eq!(page.text(&h1).as_deref(), Some("Drill"));
    /// ```
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// The document's root element, for scoped queries
    pub fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }

    /// First element matching `selector` anywhere in the document
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }

    /// Whitespace-collapsed text of the first match
    pub fn text(&self, selector: &Selector) -> Option<String> {
        first_text(self.root(), selector)
    }

    /// Link targets of every anchor matching `selector`, in document order
    pub fn hrefs(&self, selector: &Selector) -> Vec<String> {
        hrefs(self.root(), selector)
    }
}

/// Whitespace-collapsed text of the first element under `scope` matching `selector`
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

/// Attribute of the first element under `scope` matching `selector`
///
/// Returns `None` when nothing matches or the attribute is missing or blank.
pub fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Text content of an element with runs of whitespace collapsed to one space
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects followable `href` values of anchors under `scope`
///
/// Anchors are dropped when they carry no crawlable target:
/// - missing or empty `href`
/// - fragment-only links (same page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - links marked `download`
pub fn hrefs(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope
        .select(selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable(href))
        .map(str::to_string)
        .collect()
}

fn is_followable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
