use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Catalog listing page
selector!(ROW_SELECTOR, "div.game_row");
selector!(PAGER_LABEL_SELECTOR, "span.pager_label");
selector!(PAGER_LINK_SELECTOR, "span.pager_label a");

// One catalog row
selector!(TITLE_LINK_SELECTOR, "h2.game_title a");
selector!(SUMMARY_SELECTOR, "div.meta_row.game_short_text");
selector!(FILE_COUNT_SELECTOR, "div.meta_row.file_count");
selector!(PLATFORM_SELECTOR, "div.meta_row > span[title]");
regex!(FILE_COUNT_REGEX, r"(\d+) files?");
regex!(PLATFORM_REGEX, r"^Available for (\w+)");
regex!(DOWNLOAD_PATH_REGEX, r"^.*/.*/download/[a-zA-Z0-9_]+");

// Login form
selector!(CSRF_INPUT_SELECTOR, "input[name='csrf_token']");

// "My bundles" page
selector!(CATALOG_LINK_SELECTOR, ".bundle_keys a[href]");
regex!(CATALOG_ID_REGEX, r"/bundle/download/([A-Za-z0-9_-]+)");

// Item detail page
selector!(METADATA_TABLE_SELECTOR, "div.game_info_panel_widget table");
selector!(TABLE_ROW_SELECTOR, "tr");
selector!(TABLE_CELL_SELECTOR, "td");
selector!(DESCRIPTION_SELECTOR, "div.page_widget div.formatted_description");
selector!(RATING_COUNT_SELECTOR, "span.rating_count");
selector!(ANCHOR_SELECTOR, "a");

/// Format of the `title` attribute on detail-page dates, e.g. `05 June 2020 @ 14:30`
pub(crate) const DETAIL_DATETIME_FORMAT: &str = "%d %B %Y @ %H:%M";

/// Format dates are written in
pub(crate) const OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
