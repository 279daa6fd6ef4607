use crate::config::types::{Config, OutputConfig, RetryConfig, ScraperConfig, SessionConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_session_config(&config.session)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;

    let base = Url::parse(&config.site.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.max_pages_to_scrape < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages-to-scrape must be >= 1, got {}",
            config.max_pages_to_scrape
        )));
    }

    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1 when set".to_string(),
        ));
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
