//! Crawler module for walking a catalog
//!
//! This module contains the core crawling logic, including:
//! - Resolving a catalog name to its identifier
//! - Counting the catalog's pages
//! - Extracting one page's rows on a bounded worker pool
//! - Overall crawl coordination and resumption

mod coordinator;
mod locator;
mod page;
mod pager;

pub use coordinator::{run_crawl, CatalogSelector, CrawlReport, CrawlRequest, Crawler, Phase};
pub use locator::{
    catalog_id_from_href, list_catalogs, resolve, CatalogEntry, CatalogId, CATALOG_LIST_PATH,
};
pub use page::{row_markup, PageCrawler};
pub use pager::{count_pages, page_count};
