//! Session client
//!
//! Every page the crawler reads goes through [`SessionClient::fetch`], which:
//! - Resolves relative links against the configured site root
//! - Sends the session cookie
//! - Classifies failures into transport and decode errors
//! - Memoizes documents by URL for the lifetime of the client
//!
//! The memo is never evicted. One client lives for exactly one crawl run, so
//! the cache is bounded by the number of distinct URLs the run touches.

use crate::config::{CrawlerConfig, SiteConfig};
use crate::{SessionError, SessionResult};
use reqwest::header::COOKIE;
use reqwest::Client;
use scraper::Html;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Opaque session credential, sent as the `Cookie` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    pub fn cookie_header(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A fetched page, kept as its decoded body
///
/// `scraper::Html` can't be shared between worker tasks, so the cache holds
/// the body and each consumer parses its own tree with [`PageDocument::parse`].
#[derive(Debug, Clone)]
pub struct PageDocument {
    url: String,
    body: Arc<str>,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, body: impl Into<Arc<str>>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Absolute URL the document was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `site` - Site configuration (user agent)
/// * `timeout` - Timeout applied to each request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(site: &SiteConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Authenticated, memoizing fetcher shared by every crawl stage
pub struct SessionClient {
    client: Client,
    base_url: Url,
    credential: Credential,
    documents: Mutex<HashMap<String, Arc<OnceCell<PageDocument>>>>,
    network_fetches: AtomicUsize,
}

impl SessionClient {
    /// Creates a session client for the configured site
    ///
    /// # Arguments
    ///
    /// * `site` - Base URL and user agent
    /// * `crawler` - Request timeout
    /// * `credential` - Session cookie obtained from [`crate::session::login`]
    pub fn new(
        site: &SiteConfig,
        crawler: &CrawlerConfig,
        credential: Credential,
    ) -> SessionResult<Self> {
        let base_url = Url::parse(&site.base_url).map_err(|e| SessionError::Transport {
            url: site.base_url.clone(),
            message: e.to_string(),
        })?;
        let client = build_http_client(site, crawler.request_timeout())?;

        Ok(Self {
            client,
            base_url,
            credential,
            documents: Mutex::new(HashMap::new()),
            network_fetches: AtomicUsize::new(0),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a possibly relative link against the site root
    pub fn resolve(&self, link: &str) -> SessionResult<Url> {
        self.base_url
            .join(link.trim())
            .map_err(|e| SessionError::Transport {
                url: link.to_string(),
                message: format!("Invalid URL: {}", e),
            })
    }

    /// Fetches a document, reusing the copy from earlier in the run if any
    ///
    /// Concurrent callers asking for the same URL share one request. Failed
    /// fetches are not remembered, so a later call tries the network again.
    ///
    /// # Errors
    ///
    /// * `SessionError::Transport` - Connection failure or non-2xx status
    /// * `SessionError::Parse` - Body is not valid UTF-8
    pub async fn fetch(&self, link: &str) -> SessionResult<PageDocument> {
        let url = self.resolve(link)?.to_string();

        let slot = {
            let mut documents = self
                .documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(documents.entry(url.clone()).or_default())
        };

        let document = slot
            .get_or_try_init(|| self.fetch_uncached(&url))
            .await?;

        Ok(document.clone())
    }

    async fn fetch_uncached(&self, url: &str) -> SessionResult<PageDocument> {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header(COOKIE, self.credential.cookie_header())
            .send()
            .await
            .map_err(|e| SessionError::Transport {
                url: url.to_string(),
                message: describe_request_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Transport {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SessionError::Transport {
                url: url.to_string(),
                message: describe_request_error(&e),
            })?;

        let body = String::from_utf8(bytes.to_vec()).map_err(|e| SessionError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(PageDocument::new(url, body))
    }

    /// Number of requests that actually went over the network
    pub fn network_fetches(&self) -> usize {
        self.network_fetches.load(Ordering::Relaxed)
    }

    /// Number of URLs with a slot in the document memo
    pub fn cached_documents(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    }
}
