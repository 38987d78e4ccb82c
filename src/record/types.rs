//! The records written to the output file

use crate::record::{
    display_names, display_values, field_spec, format_datetime, format_links, format_optional,
    format_text, join_comma, join_lines, Buildable, FieldSpec,
};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// Title of the trailing column holding the page a row came from
pub const PAGE_COLUMN: &str = "Page in bundle";

/// Extended metadata from an item's own page
///
/// `description` is `Some("")` when the page has no custom description and
/// `None` when the page could not be fetched at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailBlock {
    pub description: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub mean_rating: Option<f64>,
    pub number_of_ratings: Option<u64>,
    /// Parallel to `author_urls`
    pub author_names: Vec<String>,
    pub author_urls: Vec<String>,
    pub genre: Option<String>,
    pub tags: BTreeSet<String>,
    pub links: BTreeSet<(String, String)>,
}

static DETAIL_FIELDS: [FieldSpec<DetailBlock>; 12] = [
    field_spec!(DetailBlock, description, Text, format_text),
    field_spec!(DetailBlock, published_at, DateTime, format_datetime),
    field_spec!(DetailBlock, updated_at, DateTime, format_datetime),
    field_spec!(DetailBlock, status, Text, format_text),
    field_spec!(DetailBlock, category, Text, format_text),
    field_spec!(DetailBlock, mean_rating, Float, format_optional),
    field_spec!(DetailBlock, number_of_ratings, Integer, format_optional),
    field_spec!(DetailBlock, author_names, List, join_comma),
    field_spec!(DetailBlock, author_urls, List, join_lines, Some("Author URLs")),
    field_spec!(DetailBlock, genre, Text, format_text),
    field_spec!(DetailBlock, tags, Set, join_comma),
    field_spec!(DetailBlock, links, Pairs, format_links),
];

impl Buildable for DetailBlock {
    fn fields() -> &'static [FieldSpec<Self>] {
        &DETAIL_FIELDS
    }
}

/// One catalog item
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub operating_systems: BTreeSet<String>,
    pub file_count: u32,
    pub details: DetailBlock,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            title: None,
            summary: None,
            url: None,
            operating_systems: BTreeSet::new(),
            file_count: 1,
            details: DetailBlock::default(),
        }
    }
}

static RECORD_FIELDS: [FieldSpec<Record>; 6] = [
    field_spec!(Record, title, Text, format_text),
    field_spec!(Record, summary, Text, format_text),
    field_spec!(Record, url, Text, format_text, Some("URL")),
    field_spec!(Record, operating_systems, Set, join_comma),
    field_spec!(Record, file_count, Count, |count: &u32| count.to_string()),
    field_spec!(Record, details, hidden Details),
];

impl Buildable for Record {
    fn fields() -> &'static [FieldSpec<Self>] {
        &RECORD_FIELDS
    }
}

impl Record {
    /// Output column titles: base fields, then detail fields, then the page column
    pub fn header() -> Vec<String> {
        let mut header = display_names::<Record>();
        header.extend(display_names::<DetailBlock>());
        header.push(PAGE_COLUMN.to_string());
        header
    }

    /// Output cells for this record on the given page
    pub fn to_row(&self, page: u32) -> Vec<String> {
        let mut row = display_values(self);
        row.extend(display_values(&self.details));
        row.push(page.to_string());
        row
    }
}
