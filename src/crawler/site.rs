//! Compiled site profile: selectors and labels for one catalog

use crate::config::SiteConfig;
use crate::{ConfigError, ConfigResult};
use scraper::Selector;

/// CSS selectors compiled once at startup and shared by all workers
#[derive(Debug)]
pub struct SiteSelectors {
    pub catalog_links: Selector,
    pub subcategory_links: Selector,
    pub item_links: Selector,
    pub pager_links: Selector,
    pub product_block: Selector,
    pub name: Selector,
    pub availability: Selector,
    pub price: Selector,
    pub property_rows: Selector,
    pub property_key: Selector,
    pub property_value: Selector,
    pub photo: Selector,
    pub description: Selector,
}

impl SiteSelectors {
    /// Compiles every selector of the site profile
    ///
    /// A bad selector is a setup error: it would fail every page of its
    /// stage, so it stops the run before the first task.
    pub fn compile(config: &SiteConfig) -> ConfigResult<Self> {
        Ok(Self {
            catalog_links: compile_selector(&config.catalog_links)?,
            subcategory_links: compile_selector(&config.subcategory_links)?,
            item_links: compile_selector(&config.item_links)?,
            pager_links: compile_selector(&config.pager_links)?,
            product_block: compile_selector(&config.product_block)?,
            name: compile_selector(&config.name)?,
            availability: compile_selector(&config.availability)?,
            price: compile_selector(&config.price)?,
            property_rows: compile_selector(&config.property_rows)?,
            property_key: compile_selector(&config.property_key)?,
            property_value: compile_selector(&config.property_value)?,
            photo: compile_selector(&config.photo)?,
            description: compile_selector(&config.description)?,
        })
    }
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Everything a handler needs to know about the crawled catalog
#[derive(Debug)]
pub struct Site {
    pub selectors: SiteSelectors,
    pub next_page_label: String,
    pub sku_label: String,
    pub manufacturer_label: String,
    pub description_label: String,
    pub unit: String,
    pub error_markers: Vec<String>,
}

impl Site {
    pub fn new(config: &SiteConfig) -> ConfigResult<Self> {
        Ok(Self {
            selectors: SiteSelectors::compile(config)?,
            next_page_label: config.next_page_label.clone(),
            sku_label: config.sku_label.clone(),
            manufacturer_label: config.manufacturer_label.clone(),
            description_label: config.description_label.clone(),
            unit: config.unit.clone(),
            error_markers: config.error_markers.clone(),
        })
    }
}
