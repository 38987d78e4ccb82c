//! Page count of a catalog, read from the pager on its first page

use crate::consts::{PAGER_LABEL_SELECTOR, PAGER_LINK_SELECTOR, ROW_SELECTOR};
use crate::crawler::locator::CatalogId;
use crate::markup::Node;
use crate::session::{PageDocument, SessionClient};
use crate::ExtractError;

/// Number of pages in a catalog
///
/// Fetches page 1 through the memoizing session, so crawling page 1
/// afterwards costs no extra request.
///
/// # Errors
///
/// * `ScrapeError::Session` - Page 1 could not be fetched
/// * `ScrapeError::Extract` - The page has neither a pager nor any rows
pub async fn count_pages(session: &SessionClient, catalog: &CatalogId) -> crate::Result<u32> {
    let document = session.fetch(&catalog.page_path(1)).await?;
    let pages = page_count(&document)?;
    tracing::info!("Catalog {} has {} page(s)", catalog, pages);
    Ok(pages)
}

/// Reads the page count from the first page of a catalog
///
/// The pager label reads like "Page 1 of <a>12</a>". A catalog short enough
/// to fit one page has no pager, only rows.
pub fn page_count(document: &PageDocument) -> Result<u32, ExtractError> {
    let html = document.parse();
    let root = Node::root(&html);
    let missing = || ExtractError::MissingPager {
        url: document.url().to_string(),
    };

    if !root.select_first(&PAGER_LABEL_SELECTOR).is_present() {
        if root.select_first(&ROW_SELECTOR).is_present() {
            return Ok(1);
        }
        return Err(missing());
    }

    root.select_first(&PAGER_LINK_SELECTOR)
        .text()
        .parse::<u32>()
        .map_err(|_| missing())
}
