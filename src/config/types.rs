use serde::Deserialize;

/// Main configuration structure for Catalog-Spider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Catalog root the `Initial` stage starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Number of worker slots running tasks concurrently
    #[serde(rename = "thread-count")]
    pub thread_count: u32,

    /// Maximum number of deliveries per task, first attempt included
    #[serde(rename = "try-limit")]
    pub try_limit: u32,

    /// Drop fresh tasks whose (stage, target) was already queued
    #[serde(rename = "dedupe-targets", default = "default_dedupe_targets")]
    pub dedupe_targets: bool,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the dated CSV file is written into
    pub directory: String,

    /// Field delimiter for the CSV file
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Character encoding of the CSV file, as a WHATWG label
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Directory for the run log file, relative to `directory` unless
    /// absolute; no log file is written when unset
    #[serde(rename = "log-directory", default)]
    pub log_directory: Option<String>,
}

/// Selectors and labels describing the crawled catalog's markup
///
/// Every field has a default matching the catalog this crawler was first
/// written for, so a config file only needs a `[site]` table to override.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Anchors on the catalog root leading to top-level listings
    pub catalog_links: String,
    /// Anchors on a listing page leading to sub-categories
    pub subcategory_links: String,
    /// Anchors on a listing page leading to item detail pages
    pub item_links: String,
    /// Anchors inside the pager block
    pub pager_links: String,
    /// Text the "next page" pager anchor contains
    pub next_page_label: String,

    /// Block holding the product details on an item page
    pub product_block: String,
    pub name: String,
    pub availability: String,
    pub price: String,
    pub property_rows: String,
    pub property_key: String,
    pub property_value: String,
    pub photo: String,
    pub description: String,

    pub sku_label: String,
    pub manufacturer_label: String,
    pub description_label: String,
    pub unit: String,

    /// Body substrings that mark an otherwise successful response as a
    /// transient error page
    pub error_markers: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            catalog_links: r#"div[class*="content"] a"#.to_string(),
            subcategory_links: r#"ul.catalog-parts a"#.to_string(),
            item_links: r#"figure[class*="catalog-item"] a.name"#.to_string(),
            pager_links: r#"div.pages a"#.to_string(),
            next_page_label: "Следующая".to_string(),
            product_block: r#"div.product-information"#.to_string(),
            name: "h1".to_string(),
            availability: r#"p.product-available.green"#.to_string(),
            price: r#"div.item_current_price"#.to_string(),
            property_rows: r#"table.prop-list tr"#.to_string(),
            property_key: "td:nth-child(1)".to_string(),
            property_value: "td:nth-child(2)".to_string(),
            photo: "a#pos-big-photo".to_string(),
            description: "div#detail-text-content".to_string(),
            sku_label: "Артикул".to_string(),
            manufacturer_label: "Производитель".to_string(),
            description_label: "Описание".to_string(),
            unit: "ед.".to_string(),
            error_markers: Vec::new(),
        }
    }
}

fn default_dedupe_targets() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

fn default_delimiter() -> char {
    ';'
}

fn default_encoding() -> String {
    "utf-8".to_string()
}
