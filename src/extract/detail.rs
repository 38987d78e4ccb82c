//! Detail page extraction
//!
//! An item's page carries a metadata table whose rows are `label | value`.
//! The table is indexed once per page into owned lookups; each extractor then
//! reads the lookup for its label. Unknown labels give an empty lookup, so a
//! page without, say, a "Genre" row just yields `None` for the genre. The only
//! structural requirement is that the table exists at all.

use crate::consts::{
    ANCHOR_SELECTOR, DESCRIPTION_SELECTOR, DETAIL_DATETIME_FORMAT, METADATA_TABLE_SELECTOR,
    RATING_COUNT_SELECTOR, TABLE_CELL_SELECTOR, TABLE_ROW_SELECTOR,
};
use crate::markup::Node;
use crate::record::{BuildPlan, DetailBlock, FieldValue};
use crate::session::{PageDocument, SessionClient};
use crate::ExtractError;
use chrono::NaiveDateTime;
use scraper::Html;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Extractors for [`DetailBlock`]
pub static DETAIL_PLAN: LazyLock<BuildPlan<DetailContext>> = LazyLock::new(|| {
    BuildPlan::new()
        .bind("description", description)
        .bind("published_at", published_at)
        .bind("updated_at", updated_at)
        .bind("status", status)
        .bind("category", category)
        .bind("mean_rating", mean_rating)
        .bind("number_of_ratings", number_of_ratings)
        .bind("author_names", author_names)
        .bind("author_urls", author_urls)
        .bind("genre", genre)
        .bind("tags", tags)
        .bind("links", links)
});

/// The value cell of one metadata row
#[derive(Debug, Default)]
struct ValueCell {
    text: String,
    first_child_title: Option<String>,
    rating_count: Option<String>,
    anchors: Vec<Anchor>,
}

#[derive(Debug)]
struct Anchor {
    text: String,
    href: Option<String>,
}

impl ValueCell {
    fn from_node(cell: Node<'_>) -> Self {
        Self {
            text: cell.text(),
            first_child_title: cell.first_child().attr("title").map(str::to_string),
            rating_count: cell
                .select_first(&RATING_COUNT_SELECTOR)
                .attr("content")
                .map(str::to_string),
            anchors: cell
                .select_all(&ANCHOR_SELECTOR)
                .into_iter()
                .map(|anchor| Anchor {
                    text: anchor.text(),
                    href: anchor.attr("href").map(str::to_string),
                })
                .collect(),
        }
    }
}

static EMPTY_CELL: ValueCell = ValueCell {
    text: String::new(),
    first_child_title: None,
    rating_count: None,
    anchors: Vec::new(),
};

/// Extraction context for one detail page
#[derive(Debug)]
pub struct DetailContext {
    url: String,
    description: Option<String>,
    rows: HashMap<String, ValueCell>,
}

impl DetailContext {
    /// Indexes a fetched detail page
    pub fn from_document(document: &PageDocument) -> Result<Self, ExtractError> {
        Self::from_html(&document.parse(), document.url())
    }

    /// Indexes a parsed detail page
    ///
    /// # Errors
    ///
    /// * `ExtractError::MissingMetadataTable` - The page has no metadata table
    pub fn from_html(document: &Html, url: &str) -> Result<Self, ExtractError> {
        let root = Node::root(document);
        let table = root
            .select_first(&METADATA_TABLE_SELECTOR)
            .require(|| ExtractError::MissingMetadataTable {
                url: url.to_string(),
            })?;

        let mut rows = HashMap::new();
        for row in Node::new(table).select_all(&TABLE_ROW_SELECTOR) {
            let cells = row.select_all(&TABLE_CELL_SELECTOR);
            let (Some(label), Some(value)) = (cells.first(), cells.get(1)) else {
                continue;
            };
            rows.entry(label.text())
                .or_insert_with(|| ValueCell::from_node(*value));
        }

        Ok(Self {
            url: url.to_string(),
            description: root
                .select_first(&DESCRIPTION_SELECTOR)
                .inner_html()
                .map(|html| html.trim().to_string()),
            rows,
        })
    }

    fn lookup(&self, label: &str) -> &ValueCell {
        self.rows.get(label).unwrap_or(&EMPTY_CELL)
    }

    fn row_text(&self, label: &str) -> Option<String> {
        self.rows.get(label).map(|cell| cell.text.clone())
    }

    fn author_anchors(&self) -> impl Iterator<Item = (&str, &str)> {
        let cell = match self.rows.get("Authors") {
            Some(cell) => cell,
            None => self.lookup("Author"),
        };
        cell.anchors
            .iter()
            .filter_map(|anchor| Some((anchor.text.as_str(), anchor.href.as_deref()?)))
    }

    fn parse_datetime(&self, label: &str) -> Option<NaiveDateTime> {
        let raw = self.lookup(label).first_child_title.as_deref()?;
        match NaiveDateTime::parse_from_str(raw.trim(), DETAIL_DATETIME_FORMAT) {
            Ok(datetime) => Some(datetime),
            Err(e) => {
                tracing::debug!("Unparseable {} date '{}' on {}: {}", label, raw, self.url, e);
                None
            }
        }
    }
}

fn description(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(Some(
        context.description.clone().unwrap_or_default(),
    )))
}

fn published_at(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::DateTime(context.parse_datetime("Published")))
}

fn updated_at(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::DateTime(context.parse_datetime("Updated")))
}

fn status(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(context.row_text("Status")))
}

fn category(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(context.row_text("Category")))
}

fn genre(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Text(context.row_text("Genre")))
}

fn mean_rating(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    let rating = context
        .lookup("Rating")
        .first_child_title
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok());
    Ok(FieldValue::Float(rating))
}

fn number_of_ratings(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    let count = context
        .lookup("Rating")
        .rating_count
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok());
    Ok(FieldValue::Integer(count))
}

fn author_names(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::List(
        context
            .author_anchors()
            .map(|(name, _)| name.to_string())
            .collect(),
    ))
}

fn author_urls(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::List(
        context
            .author_anchors()
            .map(|(_, href)| href.to_string())
            .collect(),
    ))
}

fn tags(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    Ok(FieldValue::Set(
        context
            .lookup("Tags")
            .anchors
            .iter()
            .map(|anchor| anchor.text.clone())
            .filter(|tag| !tag.is_empty())
            .collect(),
    ))
}

fn links(context: &DetailContext) -> Result<FieldValue, ExtractError> {
    let links: BTreeSet<(String, String)> = context
        .lookup("Links")
        .anchors
        .iter()
        .filter_map(|anchor| Some((anchor.text.clone(), anchor.href.clone()?)))
        .collect();
    Ok(FieldValue::Pairs(links))
}

/// Fetches and extracts item detail pages
pub struct DetailExtractor<'s> {
    session: &'s SessionClient,
}

impl<'s> DetailExtractor<'s> {
    pub fn new(session: &'s SessionClient) -> Self {
        Self { session }
    }

    /// Fetches the page at `url` and extracts its detail block
    ///
    /// # Errors
    ///
    /// * `ScrapeError::Session` - The page could not be fetched or decoded
    /// * `ScrapeError::Extract` - The page has no metadata table
    pub async fn extract(&self, url: &str) -> crate::Result<DetailBlock> {
        let document = self.session.fetch(url).await?;
        extract_document(&document)
    }
}

/// Extracts the detail block from an already fetched page
pub fn extract_document(document: &PageDocument) -> crate::Result<DetailBlock> {
    let context = DetailContext::from_document(document)?;
    Ok(DETAIL_PLAN.build(&context)?)
}
