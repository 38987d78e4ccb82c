use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Bundle Scraper
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Where the catalog lives and how we identify ourselves to it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL that every catalog, login and detail path is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://itch.io".to_string(),
            user_agent: format!("bundle-scraper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of rows of one page extracted at the same time
    #[serde(rename = "max-concurrent-rows")]
    pub max_concurrent_rows: usize,

    /// Maximum time allowed for one page, detail fetches included (seconds)
    #[serde(rename = "page-timeout")]
    pub page_timeout: u64,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl CrawlerConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rows: 8,
            page_timeout: 60,
            request_timeout: 30,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file used when `--output-path` is not given
    #[serde(rename = "default-path")]
    pub default_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_path: "./bundle_scraping_output.csv".to_string(),
        }
    }
}
