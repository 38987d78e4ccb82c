//! Crawler coordinator - main crawl orchestration logic
//!
//! A run moves through fixed phases:
//! - prepare the output file (the operator may be asked about it)
//! - resolve the catalog name to its identifier
//! - count the catalog's pages
//! - crawl each page from the resume point on, appending it as it completes
//!
//! Pages are crawled strictly in order. Any failure ends the run; pages
//! already appended stay in the output for the next run to resume after.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::locator::{self, CatalogId};
use crate::crawler::page::PageCrawler;
use crate::crawler::pager;
use crate::output::{ConflictPolicy, ConflictResolver, ResumableSink};
use crate::session::SessionClient;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// How the catalog to crawl is named on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSelector {
    /// Free text matched against catalog names
    Name(String),
    /// Identifier taken as is
    Id(CatalogId),
}

/// Everything a run needs besides the session
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub catalog: CatalogSelector,
    pub output_path: PathBuf,
    pub policy: ConflictPolicy,
    pub fetch_details: bool,
}

/// Stage of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreparedOutput,
    ResolveCatalog,
    CountPages,
    CrawlPage(u32),
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreparedOutput => write!(f, "PreparedOutput"),
            Phase::ResolveCatalog => write!(f, "ResolveCatalog"),
            Phase::CountPages => write!(f, "CountPages"),
            Phase::CrawlPage(page) => write!(f, "CrawlPage[{}]", page),
            Phase::Done => write!(f, "Done"),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub catalog: CatalogId,
    pub page_count: u32,
    /// Resume point the run started from
    pub first_page: u32,
    pub pages_crawled: u32,
    pub records_written: usize,
}

/// Main crawler structure
pub struct Crawler {
    session: Arc<SessionClient>,
    pages: PageCrawler,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `session` - Authenticated session shared with every worker
    /// * `config` - Worker count and timeouts
    /// * `fetch_details` - Whether to visit each item's own page
    pub fn new(session: Arc<SessionClient>, config: &CrawlerConfig, fetch_details: bool) -> Self {
        Self {
            pages: PageCrawler::new(Arc::clone(&session), config, fetch_details),
            session,
        }
    }

    /// Resolves the catalog and crawls its remaining pages into `sink`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every page from the resume point on was written
    /// * `Err(ScrapeError)` - The run stopped; completed pages remain in `sink`
    pub async fn run(
        &self,
        catalog: &CatalogSelector,
        sink: &mut ResumableSink,
    ) -> crate::Result<CrawlReport> {
        let start_time = Instant::now();

        let catalog = match catalog {
            CatalogSelector::Name(name) => {
                enter(Phase::ResolveCatalog);
                locator::resolve(&self.session, name).await?
            }
            CatalogSelector::Id(id) => {
                tracing::debug!("Using catalog identifier {} as given", id);
                id.clone()
            }
        };

        enter(Phase::CountPages);
        let page_count = pager::count_pages(&self.session, &catalog).await?;

        let first_page = sink.resume_point();
        if first_page > page_count {
            tracing::info!(
                "{} already holds all {} pages, nothing to crawl",
                sink.path().display(),
                page_count
            );
        }

        let mut report = CrawlReport {
            catalog: catalog.clone(),
            page_count,
            first_page,
            pages_crawled: 0,
            records_written: 0,
        };

        for page in first_page..=page_count {
            enter(Phase::CrawlPage(page));
            let records = self.pages.crawl_page(&catalog, page).await?;
            sink.append_page(page, &records)?;

            report.pages_crawled += 1;
            report.records_written = sink.rows_written();
            tracing::info!(
                "Progress: page {}/{} written ({} records, {} requests so far, {} pages cached)",
                page,
                page_count,
                records.len(),
                self.session.network_fetches(),
                self.session.cached_documents()
            );
        }

        enter(Phase::Done);
        tracing::info!(
            "Crawl completed: {} pages, {} records in {:?}",
            report.pages_crawled,
            report.records_written,
            start_time.elapsed()
        );

        Ok(report)
    }
}

fn enter(phase: Phase) {
    tracing::info!("Phase: {}", phase);
}

/// Runs the main crawl operation
///
/// The output file is prepared before any network work. Under
/// [`ConflictPolicy::Overwrite`] a failed run therefore leaves a header-only
/// file behind; under [`ConflictPolicy::Continue`] nothing is written until a
/// page completes.
///
/// # Example
///
/// ```no_run
/// use bundle_scraper::config::Config;
/// use bundle_scraper::crawler::{run_crawl, CatalogSelector, CrawlRequest};
/// use bundle_scraper::output::{ConflictPolicy, InteractivePrompt};
/// use bundle_scraper::{Credential, SessionClient};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let session = SessionClient::new(&config.site, &config.crawler, Credential::new("itchio=..."))?;
/// let request = CrawlRequest {
///     catalog: CatalogSelector::Name("Racial Justice".to_string()),
///     output_path: "out.csv".into(),
///     policy: ConflictPolicy::Continue,
///     fetch_details: true,
/// };
/// let report = run_crawl(Arc::new(session), &config, request, &mut InteractivePrompt::stdio()).await?;
/// println!("{} records", report.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    session: Arc<SessionClient>,
    config: &Config,
    request: CrawlRequest,
    resolver: &mut dyn ConflictResolver,
) -> crate::Result<CrawlReport> {
    enter(Phase::PreparedOutput);
    let mut sink = ResumableSink::open(request.output_path, request.policy, resolver)?;

    let crawler = Crawler::new(session, &config.crawler, request.fetch_details);
    crawler.run(&request.catalog, &mut sink).await
}
