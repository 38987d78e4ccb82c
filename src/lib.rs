//! Bundle Scraper: a resumable crawler for authenticated bundle catalogs
//!
//! This crate walks every page of a purchased bundle, extracts one record per
//! item (including the item's own detail page), and appends the records to a
//! delimited output file page by page so an interrupted crawl can resume.

pub mod config;
mod consts;
pub mod crawler;
pub mod extract;
pub mod markup;
pub mod output;
pub mod record;
pub mod session;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("No catalog matches '{name}'")]
    CatalogNotFound { name: String },

    #[error("Catalog name '{name}' is ambiguous, candidates: {}", .candidates.join(", "))]
    CatalogAmbiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Page {page} did not complete within {seconds}s")]
    PageTimeout { page: u32, seconds: u64 },

    #[error("Row worker for page {page} stopped unexpectedly: {message}")]
    Worker { page: u32, message: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Markup error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Record assembly error: {0}")]
    Build(#[from] record::BuildError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScrapeError {
    /// Process exit code for this failure
    ///
    /// Catalog resolution failures get their own codes so wrapper scripts can
    /// tell "wrong name" apart from a broken crawl.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CatalogNotFound { .. } => 2,
            Self::CatalogAmbiguous { .. } => 3,
            _ => 1,
        }
    }
}

/// Errors raised while talking to the site
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Response from {url} could not be decoded: {message}")]
    Parse { url: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Structural markup errors
///
/// Each of these means the site's markup no longer looks the way the
/// extractors expect.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Metadata table not found on {url}")]
    MissingMetadataTable { url: String },

    #[error("Pager label not found on {url}")]
    MissingPager { url: String },

    #[error("Catalog link does not contain an identifier: {0}")]
    MalformedLink(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CatalogId, CrawlReport, Crawler};
pub use output::{ConflictPolicy, ResumableSink};
pub use record::{DetailBlock, Record};
pub use session::{Credential, PageDocument, SessionClient};
