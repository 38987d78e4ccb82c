//! Configuration module for Bundle Scraper
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so running without a file
//! behaves exactly like an empty file.
//!
//! # Example
//!
//! ```no_run
//! use bundle_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Rows crawled concurrently: {}", config.crawler.max_concurrent_rows);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig};

// Re-export parser functions
pub use parser::{load_config, load_optional_config};
pub use validation::validate;
