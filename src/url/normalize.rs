use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "yclid", "mc_eid", "_openstat"];

/// Normalizes an absolute URL into a crawl target
///
/// # Normalization Steps
///
/// 1. Reject non-HTTP(S) schemes and host-less URLs
/// 2. Remove the fragment (everything after #)
/// 3. Remove tracking query parameters
/// 4. Sort the remaining query parameters by key (stable for equal keys)
/// 5. Remove an empty query string (trailing ?)
///
/// The path is left untouched apart from what `Url` itself resolves: catalog
/// servers commonly treat `/catalog` and `/catalog/` as different pages.
///
/// # Examples
///
/// ```
/// use catalog_spider::url::normalize_target;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/list/?page=2&sort=a#top").unwrap();
/// let target = normalize_target(url).unwrap();
/// assert_eq!(target.as_str(), "https://shop.example.com/list/?page=2&sort=a");
/// ```
pub fn normalize_target(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
