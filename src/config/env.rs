//! `SCRAPER_*` environment overrides
//!
//! Scheduled deployments set the fleet options through the environment
//! instead of editing the config file.

use crate::city::City;
use crate::config::types::Config;
use crate::{ConfigError, ConfigResult};
use std::str::FromStr;

const PREFIX: &str = "SCRAPER_";

/// Applies overrides from the process environment
pub fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    apply_overrides(config, std::env::vars())
}

/// Applies overrides from the given key/value pairs
///
/// Recognized keys (case-insensitive): `SCRAPER_CITIES` (comma-separated
/// display names), `SCRAPER_HEADLESS`, `SCRAPER_START_AT_PAGE`,
/// `SCRAPER_MAX_CONCURRENT` and `SCRAPER_MAX_PAGES_TO_SCRAPE`. Other keys
/// are ignored.
pub fn apply_overrides<I, K, V>(config: &mut Config, vars: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in vars {
        let key = key.as_ref().to_ascii_uppercase();
        let Some(name) = key.strip_prefix(PREFIX) else {
            continue;
        };
        let value = value.as_ref().trim();

        match name {
            "CITIES" => {
                let cities = value
                    .split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(City::from_str)
                    .collect::<Result<Vec<_>, _>>()?;
                config.scraper.cities = Some(cities);
            }
            "HEADLESS" => config.session.headless = parse_bool(&key, value)?,
            "START_AT_PAGE" => config.scraper.start_at_page = parse_number(&key, value)?,
            "MAX_CONCURRENT" => config.scraper.max_concurrent = parse_number(&key, value)?,
            "MAX_PAGES_TO_SCRAPE" => {
                config.scraper.max_pages_to_scrape = parse_number(&key, value)?
            }
            _ => tracing::debug!("Ignoring unknown override {}", key),
        }
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<u32> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    }
}
