//! Item URL canonicalization

use crate::consts::DOWNLOAD_PATH_REGEX;
use url::{ParseError, Url};

/// Returns the canonical page URL for an item link
///
/// Catalog rows link to a per-purchase download page such as
/// `https://dev.itch.io/game/download/AbC123`. Dropping the last two path
/// segments yields the item's own page, `https://dev.itch.io/game`, which is
/// where the detail metadata lives. Other links are returned unchanged,
/// except that relative links are made absolute against `base_url`.
///
/// # Example
///
/// ```
/// use bundle_scraper::extract::canonical_item_url;
/// use url::Url;
///
/// let base = Url::parse("https://itch.io").unwrap();
/// assert_eq!(
///     canonical_item_url("https://dev.itch.io/game/download/AbC123", &base),
///     "https://dev.itch.io/game"
/// );
/// ```
pub fn canonical_item_url(href: &str, base_url: &Url) -> String {
    let href = href.trim();
    let absolute = match Url::parse(href) {
        Ok(_) => href.to_string(),
        Err(ParseError::RelativeUrlWithoutBase) => base_url
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string()),
        Err(_) => href.to_string(),
    };

    if !DOWNLOAD_PATH_REGEX.is_match(&absolute) {
        return absolute;
    }

    let segments: Vec<&str> = absolute.split('/').collect();
    segments[..segments.len().saturating_sub(2)].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://itch.io").unwrap()
    }

    #[test]
    fn test_download_link_is_canonicalized() {
        assert_eq!(
            canonical_item_url("https://dev.itch.io/game/download/AbC_123", &base()),
            "https://dev.itch.io/game"
        );
    }

    #[test]
    fn test_download_link_with_query_is_canonicalized() {
        assert_eq!(
            canonical_item_url("https://dev.itch.io/game/download/AbC123?after=1", &base()),
            "https://dev.itch.io/game"
        );
    }

    #[test]
    fn test_non_download_link_is_unchanged() {
        assert_eq!(
            canonical_item_url("https://dev.itch.io/game", &base()),
            "https://dev.itch.io/game"
        );
        assert_eq!(
            canonical_item_url("https://dev.itch.io", &base()),
            "https://dev.itch.io"
        );
        assert_eq!(
            canonical_item_url("https://dev.itch.io/downloads/page", &base()),
            "https://dev.itch.io/downloads/page"
        );
    }

    #[test]
    fn test_relative_link_is_resolved() {
        assert_eq!(
            canonical_item_url("/game/download/XyZ", &base()),
            "https://itch.io/game"
        );
        assert_eq!(
            canonical_item_url("/some/game", &base()),
            "https://itch.io/some/game"
        );
    }
}
