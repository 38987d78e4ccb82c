//! Crawling a single catalog page
//!
//! Rows are extracted concurrently on a bounded set of worker tasks. The page
//! as a whole runs under a deadline; when it passes, the remaining workers are
//! aborted and the page fails without producing any records.

use crate::config::CrawlerConfig;
use crate::consts::ROW_SELECTOR;
use crate::crawler::locator::CatalogId;
use crate::extract::EntryExtractor;
use crate::markup::Node;
use crate::record::Record;
use crate::session::{PageDocument, SessionClient};
use crate::ScrapeError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Extracts every row of one catalog page
pub struct PageCrawler {
    session: Arc<SessionClient>,
    extractor: EntryExtractor,
    max_concurrent_rows: usize,
    page_timeout: Duration,
}

impl PageCrawler {
    /// Creates a new page crawler
    ///
    /// # Arguments
    ///
    /// * `session` - Shared session client
    /// * `config` - Worker count and page deadline
    /// * `fetch_details` - Whether rows visit their item's own page
    pub fn new(session: Arc<SessionClient>, config: &CrawlerConfig, fetch_details: bool) -> Self {
        Self {
            extractor: EntryExtractor::new(Arc::clone(&session), fetch_details),
            session,
            max_concurrent_rows: config.max_concurrent_rows,
            page_timeout: config.page_timeout(),
        }
    }

    /// Crawls one page and returns its records in page order
    ///
    /// # Errors
    ///
    /// * `ScrapeError::PageTimeout` - The page did not finish in time
    /// * Any error from fetching the page or extracting one of its rows
    pub async fn crawl_page(&self, catalog: &CatalogId, page: u32) -> crate::Result<Vec<Record>> {
        // Dropping the unfinished future drops its JoinSet, which aborts the
        // row workers still running
        match tokio::time::timeout(self.page_timeout, self.run_page(catalog, page)).await {
            Ok(records) => records,
            Err(_) => {
                tracing::warn!(
                    "Page {} exceeded {}s, aborting its row workers",
                    page,
                    self.page_timeout.as_secs()
                );
                Err(ScrapeError::PageTimeout {
                    page,
                    seconds: self.page_timeout.as_secs(),
                })
            }
        }
    }

    async fn run_page(&self, catalog: &CatalogId, page: u32) -> crate::Result<Vec<Record>> {
        let document = self.session.fetch(&catalog.page_path(page)).await?;
        let rows = row_markup(&document);
        tracing::debug!("Page {} has {} rows", page, rows.len());

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_rows));
        let mut workers = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let extractor = self.extractor.clone();
            let semaphore = Arc::clone(&semaphore);

            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ScrapeError::Worker {
                        page,
                        message: e.to_string(),
                    })?;
                let record = extractor.extract(&row).await?;
                Ok::<_, ScrapeError>((index, record))
            });
        }

        let mut records = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(ScrapeError::Worker {
                        page,
                        message: e.to_string(),
                    })
                }
            }
        }

        records.sort_by_key(|(index, _)| *index);
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }
}

/// Serialized markup of every catalog row on a page, in page order
pub fn row_markup(document: &PageDocument) -> Vec<String> {
    let html = document.parse();
    Node::root(&html)
        .select_all(&ROW_SELECTOR)
        .into_iter()
        .filter_map(|row| row.outer_html())
        .collect()
}
