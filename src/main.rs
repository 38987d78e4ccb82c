//! Bundle Scraper main entry point
//!
//! This is the command-line interface for crawling a purchased bundle into a
//! CSV file.

use anyhow::{bail, Context};
use bundle_scraper::config::load_optional_config;
use bundle_scraper::crawler::{run_crawl, CatalogSelector, CrawlReport, CrawlRequest};
use bundle_scraper::output::{ConflictPolicy, InteractivePrompt};
use bundle_scraper::session::login;
use bundle_scraper::{CatalogId, Credential, ScrapeError, SessionClient};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bundle Scraper: a resumable bundle catalog crawler
///
/// Logs in, finds the bundle whose name contains CATALOG, and writes one CSV
/// row per item. An interrupted run can be continued; it picks up after the
/// last page that was written completely.
#[derive(Parser, Debug)]
#[command(name = "bundle-scraper")]
#[command(version)]
#[command(about = "A resumable bundle catalog crawler", long_about = None)]
struct Cli {
    /// Part of the bundle's name (or its identifier with --id)
    #[arg(value_name = "CATALOG")]
    catalog: String,

    /// Account user name
    #[arg(value_name = "USERNAME", required_unless_present = "cookie")]
    username: Option<String>,

    /// Account password
    #[arg(value_name = "PASSWORD", required_unless_present = "cookie")]
    password: Option<String>,

    /// Treat CATALOG as the bundle identifier and skip the name lookup
    #[arg(long)]
    id: bool,

    /// Session cookie to use instead of logging in
    #[arg(long, env = "BUNDLE_SCRAPER_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Output CSV file [default: ./bundle_scraping_output.csv]
    #[arg(long, value_name = "PATH")]
    output_path: Option<PathBuf>,

    /// Replace an existing output file without asking
    #[arg(long, conflicts_with = "continue_")]
    overwrite: bool,

    /// Resume an existing output file without asking
    #[arg(long = "continue", id = "continue_", conflicts_with = "overwrite")]
    continue_: bool,

    /// Do not fetch each item's own page
    #[arg(long)]
    skip_details: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn policy(&self) -> ConflictPolicy {
        if self.overwrite {
            ConflictPolicy::Overwrite
        } else if self.continue_ {
            ConflictPolicy::Continue
        } else {
            ConflictPolicy::Prompt
        }
    }

    fn catalog(&self) -> CatalogSelector {
        if self.id {
            CatalogSelector::Id(CatalogId::new(self.catalog.trim()))
        } else {
            CatalogSelector::Name(self.catalog.clone())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match handle_crawl(cli).await {
        Ok(report) => {
            println!(
                "✓ Wrote {} records from {} page(s) of bundle {} ({} pages total)",
                report.records_written, report.pages_crawled, report.catalog, report.page_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Crawl failed: {:#}", e);
            let code = e
                .downcast_ref::<ScrapeError>()
                .map_or(1, ScrapeError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bundle_scraper=info,warn"),
            1 => EnvFilter::new("bundle_scraper=debug,info"),
            2 => EnvFilter::new("bundle_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the main crawl operation
async fn handle_crawl(cli: Cli) -> anyhow::Result<CrawlReport> {
    let config = load_optional_config(cli.config.as_deref())
        .map_err(ScrapeError::from)
        .context("Failed to load configuration")?;

    let credential = match (&cli.cookie, &cli.username, &cli.password) {
        (Some(cookie), _, _) => {
            tracing::info!("Using the supplied session cookie");
            Credential::new(cookie.as_str())
        }
        (None, Some(username), Some(password)) => {
            tracing::info!("Logging in as {}", username);
            login(&config.site, &config.crawler, username, password)
                .await
                .map_err(ScrapeError::from)?
        }
        _ => bail!("A USERNAME and PASSWORD, or --cookie, are required"),
    };

    let session = SessionClient::new(&config.site, &config.crawler, credential)
        .map_err(ScrapeError::from)?;

    let request = CrawlRequest {
        catalog: cli.catalog(),
        output_path: cli
            .output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.default_path)),
        policy: cli.policy(),
        fetch_details: !cli.skip_details,
    };
    tracing::info!("Writing to {}", request.output_path.display());

    let report = run_crawl(
        Arc::new(session),
        &config,
        request,
        &mut InteractivePrompt::stdio(),
    )
    .await?;

    Ok(report)
}
