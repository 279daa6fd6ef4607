//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the states of the per-city page state machine
//! - `ScrapeJob`: per-city progress that survives failed attempts

mod crawl_state;
mod scrape_job;

// Re-export main types
pub use crawl_state::CrawlState;
pub use scrape_job::ScrapeJob;
