//! Headless Chrome sessions (`browser` feature)

use crate::crawler::session::{BrowserSession, SessionLauncher};
use crate::CrawlError;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;

/// Launches one Chrome process per session
pub struct ChromeLauncher {
    headless: bool,
    user_agent: String,
}

impl ChromeLauncher {
    pub fn new(headless: bool, user_agent: impl Into<String>) -> Self {
        Self {
            headless,
            user_agent: user_agent.into(),
        }
    }
}

/// Runs a blocking DevTools call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> crate::Result<ChromeSession> {
        let headless = self.headless;
        let user_agent = self.user_agent.clone();

        let (browser, tab) = blocking(move || {
            let options = LaunchOptions::default_builder()
                .headless(headless)
                .build()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            let browser = Browser::new(options)?;
            let tab = browser.new_tab()?;
            tab.set_user_agent(&user_agent, None, None)?;
            Ok((browser, tab))
        })
        .await
        .map_err(CrawlError::Session)?;

        tracing::debug!(headless, "Launched Chrome session");
        Ok(ChromeSession {
            browser: Some(browser),
            tab,
        })
    }
}

/// Session driving a single Chrome tab
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> crate::Result<()> {
        let tab = self.tab.clone();
        let target = url.to_string();

        blocking(move || {
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
        .map_err(|message| CrawlError::Fetch {
            url: url.to_string(),
            message,
        })
    }

    async fn content(&mut self) -> crate::Result<String> {
        let tab = self.tab.clone();
        blocking(move || tab.get_content())
            .await
            .map_err(CrawlError::Session)
    }

    async fn close(&mut self) -> crate::Result<()> {
        let tab = self.tab.clone();
        let result = blocking(move || tab.close(true).map(|_| ()))
            .await
            .map_err(CrawlError::Session);

        // Dropping the browser terminates the Chrome process
        self.browser.take();
        result
    }
}
