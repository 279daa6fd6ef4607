//! Browsing sessions
//!
//! A session is the exclusively-owned fetch client of one city attempt. The
//! scheduler launches a fresh one per attempt and closes it on every exit
//! path.

use crate::config::SessionConfig;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// A page-at-a-time fetch client
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads the given url
    async fn navigate(&mut self, url: &str) -> crate::Result<()>;

    /// Returns the content of the currently loaded page
    ///
    /// Repeated reads observe changes of the page, such as a cleared access
    /// challenge.
    async fn content(&mut self) -> crate::Result<String>;

    /// Releases the session's resources
    async fn close(&mut self) -> crate::Result<()>;
}

/// Factory for fresh sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession + 'static;

    async fn launch(&self) -> crate::Result<Self::Session>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The session configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Launches [`HttpSession`]s sharing one connection pool
#[derive(Clone)]
pub struct HttpLauncher {
    client: Client,
}

impl HttpLauncher {
    pub fn new(config: &SessionConfig) -> Result<Self, CrawlError> {
        let client =
            build_http_client(config).map_err(|e| CrawlError::Session(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    type Session = HttpSession;

    async fn launch(&self) -> crate::Result<HttpSession> {
        Ok(HttpSession::new(self.client.clone()))
    }
}

/// Session over plain HTTP GET requests
///
/// The body fetched by `navigate` is served by the next `content` call;
/// later calls fetch the current url again.
pub struct HttpSession {
    client: Client,
    current_url: Option<String>,
    pending_body: Option<String>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current_url: None,
            pending_body: None,
        }
    }

    async fn get(&self, url: &str) -> crate::Result<String> {
        let fetch_error = |message: String| CrawlError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> crate::Result<()> {
        let body = self.get(url).await?;
        self.current_url = Some(url.to_string());
        self.pending_body = Some(body);
        Ok(())
    }

    async fn content(&mut self) -> crate::Result<String> {
        if let Some(body) = self.pending_body.take() {
            return Ok(body);
        }

        match self.current_url.clone() {
            Some(url) => self.get(&url).await,
            None => Err(CrawlError::Session("no page has been loaded".to_string())),
        }
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.current_url = None;
        self.pending_body = None;
        Ok(())
    }
}
