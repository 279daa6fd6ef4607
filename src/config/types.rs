use crate::city::{City, DEFAULT_BASE_URL};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for wgwatch
///
/// Every section is optional; missing sections and keys take the defaults
/// the crawler has always run with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub scraper: ScraperConfig,
    pub session: SessionConfig,
    pub site: SiteConfig,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

impl Config {
    /// The cities to crawl: the configured list, or every known city
    pub fn target_cities(&self) -> Vec<City> {
        match &self.scraper.cities {
            Some(cities) if !cities.is_empty() => cities.clone(),
            _ => City::ALL.to_vec(),
        }
    }
}

/// Fleet-level crawl settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Cities to crawl (all cities when unset)
    pub cities: Option<Vec<City>>,

    /// Page index each city starts from
    pub start_at_page: u32,

    /// Maximum number of cities crawled at the same time
    pub max_concurrent: u32,

    /// Maximum number of pages scraped per city
    pub max_pages_to_scrape: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            cities: None,
            start_at_page: 0,
            max_concurrent: 3,
            max_pages_to_scrape: 30,
        }
    }
}

/// Which client fetches pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEngine {
    /// Plain HTTP requests
    #[default]
    Http,
    /// A Chrome instance driven over the DevTools protocol
    Chrome,
}

/// Browsing session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub engine: SessionEngine,

    /// Run the browser without a visible window
    pub headless: bool,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: SessionEngine::Http,
            headless: false,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Listing site location
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Fixed delays of the page state machine (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Wait after navigation before reading content
    pub settle_delay_ms: u64,

    /// Interval between content reads while a challenge is shown
    pub captcha_poll_ms: u64,

    /// Extra wait once a challenge has cleared
    pub captcha_settle_ms: u64,

    /// Wait between two pages of the same city
    pub inter_page_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 5000,
            captcha_poll_ms: 5000,
            captcha_settle_ms: 4000,
            inter_page_delay_ms: 1000,
        }
    }
}

/// Retry behaviour of the city scheduler
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Wait between a failed attempt and the next one (seconds)
    pub backoff_secs: u64,

    /// Attempts per city before giving up (unbounded when unset)
    pub max_attempts: Option<u32>,

    /// Longest tolerated access-challenge stall (unbounded when unset)
    pub captcha_timeout_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: 10,
            max_attempts: None,
            captcha_timeout_secs: None,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn captcha_timeout(&self) -> Option<Duration> {
        self.captcha_timeout_secs.map(Duration::from_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "wgwatch.db".to_string(),
        }
    }
}
