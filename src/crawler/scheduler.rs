//! Fleet scheduler
//!
//! This module handles:
//! - One task per city on a bounded worker pool
//! - A fresh session per attempt, closed on every exit path
//! - Retry with backoff, resuming at the first unscraped page

use crate::city::City;
use crate::config::Config;
use crate::crawler::page_crawler::{CrawlSettings, PageCrawler};
use crate::crawler::pool::WorkerPool;
use crate::crawler::session::{BrowserSession, SessionLauncher};
use crate::state::ScrapeJob;
use crate::storage::ListingSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fleet-level settings
#[derive(Debug, Clone)]
pub struct FleetSettings {
    /// Cities crawled at the same time
    pub max_concurrency: usize,
    /// Page each city starts from
    pub start_page: u32,
    /// Wait after a failed attempt
    pub backoff: Duration,
    /// Attempts per city before it is abandoned; unbounded when `None`
    pub max_attempts: Option<u32>,
    pub crawl: CrawlSettings,
}

impl FleetSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrency: config.scraper.max_concurrent as usize,
            start_page: config.scraper.start_at_page,
            backoff: config.retry.backoff(),
            max_attempts: config.retry.max_attempts,
            crawl: CrawlSettings::from_config(config),
        }
    }
}

/// Outcome of a whole fleet run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub completed: Vec<City>,
    pub abandoned: Vec<City>,
}

impl FleetSummary {
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }
}

enum CityOutcome {
    Completed(City),
    Abandoned(City),
}

/// Runs one page crawler per city with retry and backoff
pub struct CityScheduler<L, K: ?Sized> {
    launcher: Arc<L>,
    sink: Arc<K>,
    settings: Arc<FleetSettings>,
}

impl<L, K> CityScheduler<L, K>
where
    L: SessionLauncher + 'static,
    K: ListingSink + ?Sized + 'static,
{
    pub fn new(launcher: L, sink: Arc<K>, settings: FleetSettings) -> Self {
        Self {
            launcher: Arc::new(launcher),
            sink,
            settings: Arc::new(settings),
        }
    }

    /// Crawls every city and returns once all city tasks have ended
    ///
    /// A city that keeps failing is retried until `max_attempts` (if set)
    /// is used up; it never stops the other cities.
    pub async fn run_fleet(&self, cities: Vec<City>) -> FleetSummary {
        let pool = WorkerPool::new(self.settings.max_concurrency);
        info!(
            cities = cities.len(),
            max_concurrency = pool.capacity(),
            "Starting fleet"
        );

        let outcomes = pool
            .run(cities, |pool, city| {
                let launcher = self.launcher.clone();
                let sink = self.sink.clone();
                let settings = self.settings.clone();
                async move { run_city(pool, launcher, sink, settings, city).await }
            })
            .await;

        let mut summary = FleetSummary::default();
        for outcome in outcomes {
            match outcome {
                CityOutcome::Completed(city) => summary.completed.push(city),
                CityOutcome::Abandoned(city) => summary.abandoned.push(city),
            }
        }

        info!(
            completed = summary.completed.len(),
            abandoned = summary.abandoned.len(),
            "Fleet finished"
        );
        summary
    }
}

async fn run_city<L, K>(
    pool: WorkerPool,
    launcher: Arc<L>,
    sink: Arc<K>,
    settings: Arc<FleetSettings>,
    city: City,
) -> CityOutcome
where
    L: SessionLauncher,
    K: ListingSink + ?Sized,
{
    let mut job = ScrapeJob::new(city, settings.start_page);

    loop {
        let slot = match pool.acquire().await {
            Ok(slot) => slot,
            Err(e) => {
                error!(city = %city, error = %e, "Worker pool closed, abandoning city");
                return CityOutcome::Abandoned(city);
            }
        };

        let result = attempt(&*launcher, &*sink, &settings.crawl, &mut job).await;
        drop(slot);

        match result {
            Ok(()) => {
                info!(city = %city, pages = job.pages_scraped(), "City completed");
                return CityOutcome::Completed(city);
            }
            Err(e) => {
                job.record_failure();
                error!(
                    city = %city,
                    attempt = job.retry_count,
                    page = job.current_page,
                    error = %e,
                    "City attempt failed"
                );

                if let Some(max) = settings.max_attempts {
                    if job.retry_count >= max {
                        error!(city = %city, attempts = job.retry_count, "Giving up on city");
                        return CityOutcome::Abandoned(city);
                    }
                }

                tokio::time::sleep(settings.backoff).await;
            }
        }
    }
}

/// One attempt: fresh session, crawl, close
async fn attempt<L, K>(
    launcher: &L,
    sink: &K,
    settings: &CrawlSettings,
    job: &mut ScrapeJob,
) -> crate::Result<()>
where
    L: SessionLauncher,
    K: ListingSink + ?Sized,
{
    let mut session = launcher.launch().await?;
    let result = PageCrawler::new(&mut session, sink, settings).run(job).await;

    if let Err(e) = session.close().await {
        warn!(city = %job.city, error = %e, "Failed to close session");
    }
    result
}
