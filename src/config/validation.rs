use crate::config::types::{
    BrowserConfig, Config, CoordinatorConfig, LimiterConfig, OutputConfig, TargetConfig,
};
use crate::ConfigError;
use url::Url;

/// Hard bound on the page budget a single run may request
pub const MAX_PAGE_BUDGET: u32 = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_limiter_config(&config.limiter)?;
    validate_coordinator_config(&config.coordinator)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.domain)?;
    validate_path_segment("entity-path", &config.entity_path)?;

    if let Some(subpath) = &config.detail_subpath {
        validate_path_segment("detail-subpath", subpath)?;
    }

    if config.listing_path.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "listing-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_limiter_config(config: &LimiterConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.min_floor_ms < 2_000 {
        return Err(ConfigError::Validation(format!(
            "min-floor-ms must be >= 2000ms, got {}ms",
            config.min_floor_ms
        )));
    }

    Ok(())
}

fn validate_coordinator_config(config: &CoordinatorConfig) -> Result<(), ConfigError> {
    if config.default_max_pages < 1 || config.default_max_pages > MAX_PAGE_BUDGET {
        return Err(ConfigError::Validation(format!(
            "default-max-pages must be between 1 and {}, got {}",
            MAX_PAGE_BUDGET, config.default_max_pages
        )));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry-attempts must be >= 1".to_string(),
        ));
    }

    for (name, value) in [
        ("navigation-timeout-ms", config.navigation_timeout_ms),
        ("content-timeout-ms", config.content_timeout_ms),
        ("tab-load-timeout-ms", config.tab_load_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if let Some(listing_url) = &config.listing_url {
        let url = Url::parse(listing_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid listing-url '{}': {}", listing_url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "listing-url '{}' must use http or https",
                listing_url
            )));
        }
    }

    if let Some(debugger_url) = &config.debugger_url {
        if !debugger_url.starts_with("ws://") && !debugger_url.starts_with("wss://") {
            return Err(ConfigError::InvalidUrl(format!(
                "debugger-url must be a websocket URL, got '{}'",
                debugger_url
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_path_segment(name: &str, segment: &str) -> Result<(), ConfigError> {
    if segment.is_empty() || segment.contains('/') {
        return Err(ConfigError::Validation(format!(
            "{} must be a single non-empty path segment, got '{}'",
            name, segment
        )));
    }
    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
