//! Configuration module for wgwatch
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and applying `SCRAPER_*` environment overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use wgwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wgwatch.toml")).unwrap();
//! println!("Crawling {} cities", config.target_cities().len());
//! ```

mod env;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, RetryConfig, ScraperConfig, SessionConfig, SessionEngine, SiteConfig,
    TimingConfig,
};

// Re-export parser functions
pub use env::{apply_env_overrides, apply_overrides};
pub use parser::{
    compute_config_hash, hash_config_content, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
