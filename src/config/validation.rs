use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::crawler::SiteSelectors;
use crate::output::output_encoding;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_site_config(&config.site)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let start = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url: {}", e)))?;

    if start.scheme() != "http" && start.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url must use http or https, got '{}'",
            start.scheme()
        )));
    }

    if start.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(
            "start-url must include a host".to_string(),
        ));
    }

    if config.thread_count < 1 || config.thread_count > 100 {
        return Err(ConfigError::Validation(format!(
            "thread-count must be between 1 and 100, got {}",
            config.thread_count
        )));
    }

    if config.try_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "try-limit must be >= 1, got {}",
            config.try_limit
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    // The csv writer takes a single byte
    let d = config.delimiter;
    if !d.is_ascii() || d.is_ascii_alphanumeric() || matches!(d, '"' | '\n' | '\r') {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII punctuation or whitespace character, got {:?}",
            d
        )));
    }

    output_encoding(&config.encoding)?;

    if config.log_directory.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "log-directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site selectors and labels
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    for (field, label) in [
        ("next-page-label", &config.next_page_label),
        ("sku-label", &config.sku_label),
        ("manufacturer-label", &config.manufacturer_label),
        ("description-label", &config.description_label),
    ] {
        if label.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
    }

    if config.error_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "error-markers cannot contain empty strings".to_string(),
        ));
    }

    SiteSelectors::compile(config)?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
