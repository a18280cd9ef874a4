//! URL handling module for Catalog-Spider
//!
//! This module turns the raw `href` values found on catalog pages into
//! normalized crawl targets.

mod normalize;

pub use normalize::normalize_target;

use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a raw link against the page it was found on and normalizes it
///
/// Relative links are joined onto `base`; absolute links are taken as-is.
/// `extra_params` are appended to the query before normalization, so they
/// end up sorted together with the link's own parameters.
///
/// # Arguments
///
/// * `base` - The URL of the page the link was found on
/// * `raw_link` - The `href` value as found in the document
/// * `extra_params` - Additional query parameters to attach
///
/// # Returns
///
/// * `Ok(Url)` - The normalized target
/// * `Err(UrlError)` - The link is empty, unparseable, or not HTTP(S)
///
/// # Examples
///
/// ```
/// use catalog_spider::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/catalog/").unwrap();
/// let target = resolve(&base, "/catalog/tools/?sort=price#top", &[("page", "2")]).unwrap();
/// assert_eq!(
///     target.as_str(),
///     "https://shop.example.com/catalog/tools/?page=2&sort=price"
/// );
/// ```
pub fn resolve(base: &Url, raw_link: &str, extra_params: &[(&str, &str)]) -> UrlResult<Url> {
    let raw_link = raw_link.trim();

    if raw_link.is_empty() {
        return Err(UrlError::Parse("empty link".to_string()));
    }

    let mut url = base
        .join(raw_link)
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw_link, e)))?;

    if !extra_params.is_empty() {
        url.query_pairs_mut().extend_pairs(extra_params.iter());
    }

    normalize_target(url)
}
