//! Catalog row extraction

use crate::consts::{
    FILE_COUNT_REGEX, FILE_COUNT_SELECTOR, PLATFORM_REGEX, PLATFORM_SELECTOR, SUMMARY_SELECTOR,
    TITLE_LINK_SELECTOR,
};
use crate::extract::detail::DetailExtractor;
use crate::extract::url::canonical_item_url;
use crate::markup::Node;
use crate::record::{BuildPlan, DetailBlock, FieldValue, Record};
use crate::session::SessionClient;
use crate::{ExtractError, ScrapeError, SessionError};
use scraper::Html;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use url::Url;

/// Extractors for the fields a catalog row carries by itself
pub static ENTRY_PLAN: LazyLock<BuildPlan<EntryContext>> = LazyLock::new(row_plan);

/// [`ENTRY_PLAN`] plus the item's detail block
pub static FULL_ENTRY_PLAN: LazyLock<BuildPlan<EntryContext>> =
    LazyLock::new(|| row_plan().overlay(BuildPlan::new().bind("details", details)));

fn row_plan() -> BuildPlan<EntryContext> {
    BuildPlan::new()
        .bind("title", title)
        .bind("summary", summary)
        .bind("url", url)
        .bind("operating_systems", operating_systems)
        .bind("file_count", file_count)
}

/// Extraction context for one catalog row
///
/// The row is parsed once and read into owned values, so the context can be
/// held across the detail page fetch.
#[derive(Debug)]
pub struct EntryContext {
    title: String,
    summary: String,
    item_url: Option<String>,
    file_count_label: Option<String>,
    platform_titles: Vec<String>,
    details: DetailBlock,
}

impl EntryContext {
    /// Parses the serialized markup of one `div.game_row`
    pub fn parse(row_html: &str, base_url: &Url) -> Self {
        let row = Html::parse_fragment(row_html);
        let root = Node::root(&row);
        let title_link = root.select_first(&TITLE_LINK_SELECTOR);

        Self {
            title: title_link.text(),
            summary: root.select_first(&SUMMARY_SELECTOR).text(),
            item_url: title_link
                .attr("href")
                .filter(|href| !href.trim().is_empty())
                .map(|href| canonical_item_url(href, base_url)),
            file_count_label: root.select_first(&FILE_COUNT_SELECTOR).text_opt(),
            platform_titles: root
                .select_all(&PLATFORM_SELECTOR)
                .into_iter()
                .filter_map(|span| span.attr("title").map(str::to_string))
                .collect(),
            details: DetailBlock::default(),
        }
    }

    pub fn with_details(mut self, details: DetailBlock) -> Self {
        self.details = details;
        self
    }

    /// Canonical item URL, `None` when the row has no usable title link
    pub fn canonical_url(&self) -> Option<&str> {
        self.item_url.as_deref()
    }
}

fn title(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(Some(context.title.clone())))
}

fn summary(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(Some(context.summary.clone())))
}

fn url(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(context.item_url.clone()))
}

fn file_count(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    let Some(label) = &context.file_count_label else {
        return Ok(FieldValue::Count(1));
    };

    let count = FILE_COUNT_REGEX
        .captures(label)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse::<u32>().ok());

    match count {
        Some(count) => Ok(FieldValue::Count(count)),
        None => {
            tracing::warn!("Unrecognised file count label '{}', assuming 1", label);
            Ok(FieldValue::Count(1))
        }
    }
}

fn operating_systems(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    let systems: BTreeSet<String> = context
        .platform_titles
        .iter()
        .filter_map(|title| {
            PLATFORM_REGEX
                .captures(title)
                .and_then(|captures| captures.get(1))
                .map(|name| name.as_str().to_string())
        })
        .collect();
    Ok(FieldValue::Set(systems))
}

fn details(context: &EntryContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Details(Box::new(context.details.clone())))
}

/// Turns catalog rows into records, fetching each item's detail page
#[derive(Clone)]
pub struct EntryExtractor {
    session: Arc<SessionClient>,
    fetch_details: bool,
}

impl EntryExtractor {
    /// Creates a new entry extractor
    ///
    /// # Arguments
    ///
    /// * `session` - Shared session client
    /// * `fetch_details` - Whether to visit each item's own page
    pub fn new(session: Arc<SessionClient>, fetch_details: bool) -> Self {
        Self {
            session,
            fetch_details,
        }
    }

    /// Extracts one record from a row's serialized markup
    ///
    /// A detail page that cannot be fetched or decoded leaves the record with
    /// an empty detail block. A detail page whose markup has no metadata
    /// table fails the row.
    pub async fn extract(&self, row_html: &str) -> crate::Result<Record> {
        let context = EntryContext::parse(row_html, self.session.base_url());

        if !self.fetch_details {
            return Ok(ENTRY_PLAN.build(&context)?);
        }

        let details = match context.canonical_url() {
            Some(item_url) => self.detail_block(item_url).await?,
            None => {
                tracing::debug!("Row has no item link, skipping detail page");
                DetailBlock::default()
            }
        };

        Ok(FULL_ENTRY_PLAN.build(&context.with_details(details))?)
    }

    async fn detail_block(&self, item_url: &str) -> crate::Result<DetailBlock> {
        match DetailExtractor::new(&self.session).extract(item_url).await {
            Ok(block) => Ok(block),
            Err(ScrapeError::Session(
                e @ (SessionError::Transport { .. } | SessionError::Parse { .. }),
            )) => {
                tracing::warn!("Detail page unavailable, using empty details: {}", e);
                Ok(DetailBlock::default())
            }
            Err(e) => Err(e),
        }
    }
}
