//! Crawler module
//!
//! This module contains the crawling logic, including:
//! - Browsing sessions (HTTP, and headless Chrome with the `browser` feature)
//! - The per-city page state machine
//! - The bounded worker pool
//! - Fleet scheduling with retry and backoff

#[cfg(feature = "browser")]
mod chrome;
mod page_crawler;
mod pool;
mod scheduler;
mod session;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "browser")]
pub use chrome::{ChromeLauncher, ChromeSession};
pub use page_crawler::{CrawlSettings, PageCrawler};
pub use pool::{Slot, WorkerPool};
pub use scheduler::{CityScheduler, FleetSettings, FleetSummary};
pub use session::{build_http_client, BrowserSession, HttpLauncher, HttpSession, SessionLauncher};
