//! Scripted sessions and sinks for crawler tests

use crate::city::City;
use crate::crawler::page_crawler::CrawlSettings;
use crate::crawler::session::{BrowserSession, SessionLauncher};
use crate::extractor::ListingRecord;
use crate::storage::{ListingSink, StorageError, StorageResult};
use crate::CrawlError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Builds a listing page with `listings` entries whose pagination reports
/// `last_page` as the final page index
pub fn site_page(page: u32, listings: usize, last_page: u32) -> String {
    let items: Vec<String> = (0..listings)
        .map(|i| {
            let id = page as usize * 100 + i + 1;
            format!(
                r#"{{"@type": "ListItem", "position": {pos}, "item": {{"@type": "Product", "name": "p{page}-{i}",
                    "url": "https://www.wg-gesucht.de/wg-zimmer-in-Berlin.{id}.html",
                    "offers": {{"@type": "Offer", "price": "450", "priceCurrency": "EUR"}}}}}}"#,
                pos = i + 1,
            )
        })
        .collect();

    let labels: String = (1..=last_page + 1)
        .map(|n| format!(r##"<li><a class="page-link" href="#">{n}</a></li>"##))
        .collect();

    format!(
        r#"<html><head><script type="application/ld+json">[
            {{"@type": "CollectionPage", "mainEntity": {{"@type": "ItemList", "itemListElement": [{items}]}}}}
        ]</script></head><body>
            <div data-id="{first}"><b>20 m²</b></div>
            <ul id="assets_list_pagination">{labels}</ul>
        </body></html>"#,
        items = items.join(","),
        first = page as usize * 100 + 1,
    )
}

/// Settings without delays and without a challenge timeout
pub fn fast_settings(max_pages: usize) -> CrawlSettings {
    CrawlSettings {
        base_url: "http://localhost".to_string(),
        settle_delay: Duration::ZERO,
        captcha_poll: Duration::from_millis(1),
        captcha_settle: Duration::ZERO,
        inter_page_delay: Duration::ZERO,
        captcha_timeout: None,
        max_pages,
    }
}

pub const CHALLENGE_PAGE: &str = r#"<html><body><div class="g-recaptcha"></div></body></html>"#;

/// Reads `(city, page)` back out of a listing url
pub fn parse_listing_url(url: &str) -> (City, u32) {
    let (path, query) = url.split_once('?').unwrap();
    let page = path
        .trim_end_matches(".html")
        .rsplit('.')
        .next()
        .unwrap()
        .parse()
        .unwrap();
    let id: u32 = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("city_id="))
        .unwrap()
        .parse()
        .unwrap();
    let city = City::ALL.into_iter().find(|c| c.site_id() == id).unwrap();
    (city, page)
}

/// Shared, inspectable behaviour of a scripted site
#[derive(Default)]
pub struct SiteScript {
    /// Index of the last page of every city
    pub last_page: u32,
    /// Listings per page
    pub listings: usize,
    /// Remaining navigation failures per page
    pub failures: HashMap<u32, u32>,
    /// Challenge reads served before real content, per page
    pub challenges: HashMap<u32, u32>,
    /// Pages served without a structured block
    pub broken_pages: Vec<u32>,

    pub navigations: Vec<(City, u32)>,
    pub launches: usize,
    pub closes: usize,
    pub live: usize,
    pub peak_live: usize,
    pub launch_times: Vec<Instant>,
    pub close_times: Vec<Instant>,
}

#[derive(Clone)]
pub struct ScriptedLauncher {
    pub script: Arc<Mutex<SiteScript>>,
}

impl ScriptedLauncher {
    pub fn new(script: SiteScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, SiteScript> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    async fn launch(&self) -> crate::Result<ScriptedSession> {
        {
            let mut script = self.script();
            script.launches += 1;
            script.launch_times.push(Instant::now());
            script.live += 1;
            script.peak_live = script.peak_live.max(script.live);
        }
        // Let other tasks run while this session is live
        tokio::task::yield_now().await;
        Ok(ScriptedSession {
            script: self.script.clone(),
            page: None,
            open: true,
        })
    }
}

pub struct ScriptedSession {
    script: Arc<Mutex<SiteScript>>,
    page: Option<u32>,
    open: bool,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> crate::Result<()> {
        let (city, page) = parse_listing_url(url);
        let mut script = self.script.lock().unwrap();
        if let Some(remaining) = script.failures.get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CrawlError::Fetch {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
        }
        script.navigations.push((city, page));
        self.page = Some(page);
        Ok(())
    }

    async fn content(&mut self) -> crate::Result<String> {
        tokio::task::yield_now().await;
        let page = self
            .page
            .ok_or_else(|| CrawlError::Session("nothing loaded".to_string()))?;
        let mut script = self.script.lock().unwrap();
        if let Some(remaining) = script.challenges.get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(CHALLENGE_PAGE.to_string());
            }
        }
        if script.broken_pages.contains(&page) {
            return Ok("<html><body>maintenance</body></html>".to_string());
        }
        Ok(site_page(page, script.listings, script.last_page))
    }

    async fn close(&mut self) -> crate::Result<()> {
        if self.open {
            self.open = false;
            let mut script = self.script.lock().unwrap();
            script.closes += 1;
            script.close_times.push(Instant::now());
            script.live -= 1;
        }
        Ok(())
    }
}

/// Sink recording every batch it receives
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<(City, u32, Vec<ListingRecord>)>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn pages(&self, city: City) -> Vec<u32> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| *c == city)
            .map(|(_, page, _)| *page)
            .collect()
    }
}

#[async_trait]
impl ListingSink for RecordingSink {
    async fn accept_batch(
        &self,
        city: City,
        page: u32,
        records: Vec<ListingRecord>,
    ) -> StorageResult<()> {
        if self.fail {
            return Err(StorageError::LockPoisoned);
        }
        self.batches.lock().unwrap().push((city, page, records));
        Ok(())
    }
}
