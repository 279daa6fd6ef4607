//! Per-city page state machine
//!
//! One `PageCrawler` drives a single city attempt over one session:
//! fetch a page, wait out an access challenge if one is served, extract,
//! hand the batch to the sink, then advance or stop.

use crate::city::listing_url;
use crate::config::Config;
use crate::crawler::session::BrowserSession;
use crate::extractor::{extract_page, is_challenge_page, ExtractedPage};
use crate::state::{CrawlState, ScrapeJob};
use crate::storage::ListingSink;
use crate::CrawlError;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

/// Delays and limits of a city attempt
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_url: String,
    pub settle_delay: Duration,
    pub captcha_poll: Duration,
    pub captcha_settle: Duration,
    pub inter_page_delay: Duration,
    /// Longest tolerated challenge stall; unbounded when `None`
    pub captcha_timeout: Option<Duration>,
    /// Pages scraped per city across all attempts
    pub max_pages: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.site.base_url.clone(),
            settle_delay: Duration::from_millis(config.timing.settle_delay_ms),
            captcha_poll: Duration::from_millis(config.timing.captcha_poll_ms),
            captcha_settle: Duration::from_millis(config.timing.captcha_settle_ms),
            inter_page_delay: Duration::from_millis(config.timing.inter_page_delay_ms),
            captcha_timeout: config.retry.captcha_timeout(),
            max_pages: config.scraper.max_pages_to_scrape as usize,
        }
    }
}

/// State of the machine together with the data the next step consumes
enum Step {
    Fetching,
    CaptchaWait { url: String },
    Extracting { content: String },
    Persisting { page: ExtractedPage },
    Advancing { last_page: u32 },
    Done,
}

impl Step {
    fn state(&self) -> CrawlState {
        match self {
            Self::Fetching => CrawlState::Fetching,
            Self::CaptchaWait { .. } => CrawlState::CaptchaWait,
            Self::Extracting { .. } => CrawlState::Extracting,
            Self::Persisting { .. } => CrawlState::Persisting,
            Self::Advancing { .. } => CrawlState::Advancing,
            Self::Done => CrawlState::Done,
        }
    }
}

/// Crawls the pages of one city over a borrowed session
pub struct PageCrawler<'a, S: ?Sized, K: ?Sized> {
    session: &'a mut S,
    sink: &'a K,
    settings: &'a CrawlSettings,
}

impl<'a, S, K> PageCrawler<'a, S, K>
where
    S: BrowserSession + ?Sized,
    K: ListingSink + ?Sized,
{
    pub fn new(session: &'a mut S, sink: &'a K, settings: &'a CrawlSettings) -> Self {
        Self {
            session,
            sink,
            settings,
        }
    }

    /// Runs the attempt from the job's resume page until the city is done
    ///
    /// The job is updated as pages are persisted, so after an error it
    /// still reflects every page that reached the sink.
    pub async fn run(&mut self, job: &mut ScrapeJob) -> crate::Result<()> {
        job.rewind();
        let city = job.city;
        let mut step = Step::Fetching;

        while !step.state().is_terminal() {
            let from = step.state();
            step = match step {
                Step::Fetching => {
                    let url = listing_url(&self.settings.base_url, city, job.current_page);
                    info!(city = %city, page = job.current_page, url = %url, "Fetching listing page");

                    self.session.navigate(&url).await?;
                    sleep(self.settings.settle_delay).await;
                    let content = self.session.content().await?;

                    if is_challenge_page(&content) {
                        Step::CaptchaWait { url }
                    } else {
                        Step::Extracting { content }
                    }
                }
                Step::CaptchaWait { url } => {
                    let content = self.wait_for_challenge(job, &url).await?;
                    Step::Extracting { content }
                }
                Step::Extracting { content } => Step::Persisting {
                    page: extract_page(&content)?,
                },
                Step::Persisting { page } => {
                    let count = page.listings.len();
                    self.sink
                        .accept_batch(city, job.current_page, page.listings)
                        .await?;
                    info!(
                        city = %city,
                        page = job.current_page,
                        listings = count,
                        last_page = page.last_page,
                        "Persisted listing page"
                    );
                    Step::Advancing {
                        last_page: page.last_page,
                    }
                }
                Step::Advancing { last_page } => {
                    job.advance();
                    if job.is_finished(last_page, self.settings.max_pages) {
                        Step::Done
                    } else {
                        sleep(self.settings.inter_page_delay).await;
                        Step::Fetching
                    }
                }
                Step::Done => break,
            };

            let to = step.state();
            debug_assert!(from.can_transition_to(to), "{from} -> {to}");
            trace!(city = %city, page = job.current_page, from = %from, to = %to, "State transition");
        }

        debug!(city = %city, pages = job.pages_scraped(), "City crawl finished");
        Ok(())
    }

    /// Polls until the challenge marker is gone, then settles and re-reads
    async fn wait_for_challenge(&mut self, job: &ScrapeJob, url: &str) -> crate::Result<String> {
        let started = Instant::now();
        warn!(city = %job.city, page = job.current_page, url = %url, "Access challenge served, waiting for it to clear");

        loop {
            if let Some(limit) = self.settings.captcha_timeout {
                let waited = started.elapsed();
                if waited >= limit {
                    return Err(CrawlError::ChallengeTimeout {
                        url: url.to_string(),
                        waited,
                    });
                }
            }

            sleep(self.settings.captcha_poll).await;
            let content = self.session.content().await?;
            if !is_challenge_page(&content) {
                break;
            }
            debug!(city = %job.city, waited = ?started.elapsed(), "Challenge still present");
        }

        info!(city = %job.city, waited = ?started.elapsed(), "Access challenge cleared");
        sleep(self.settings.captcha_settle).await;
        self.session.content().await
    }
}
