//! wgwatch: a paginated listing crawler for wg-gesucht.de
//!
//! This crate crawls the listing pages of a fixed set of cities, extracts the
//! embedded structured listing data, and hands each page's listings to a
//! storage sink. One crawl task runs per city under a concurrency bound, and
//! failed cities are retried after a backoff delay.

pub mod city;
pub mod config;
pub mod crawler;
pub mod extractor;
pub mod output;
pub mod state;
pub mod storage;

use std::time::Duration;
use thiserror::Error;

/// Main error type for a crawl attempt
///
/// Every variant aborts the current city attempt. The scheduler logs it,
/// waits the backoff delay and resumes the city.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Browsing session error: {0}")]
    Session(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("Access challenge at {url} did not clear within {waited:?}")]
    ChallengeTimeout { url: String, waited: Duration },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Errors raised while turning page content into listing records
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No structured listing block found in page content")]
    NoStructuredBlock,

    #[error("Structured listing block is not valid: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Structured listing block has no CollectionPage entry")]
    MissingCollection,
}

/// A listing url without a numeric id before the `.html` suffix
///
/// Never fatal: it only suppresses the square-meter lookup for one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No listing id could be extracted from url: {url}")]
pub struct IdParseError {
    pub url: String,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use city::City;
pub use config::Config;
pub use extractor::{ExtractedPage, ListingRecord};
pub use state::{CrawlState, ScrapeJob};
