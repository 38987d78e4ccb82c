//! Catalog name resolution
//!
//! The "my bundles" page lists every catalog the account owns. A catalog is
//! picked by case-sensitive substring match against the link text, which must
//! select exactly one entry.

use crate::consts::{CATALOG_ID_REGEX, CATALOG_LINK_SELECTOR};
use crate::markup::Node;
use crate::session::{PageDocument, SessionClient};
use crate::{ExtractError, ScrapeError};
use std::fmt;

/// Path of the page listing the account's catalogs
pub const CATALOG_LIST_PATH: &str = "/my-purchases/bundles";

/// Identifier of a catalog, as it appears in its download URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogId(String);

impl CatalogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of one page of this catalog
    pub fn page_path(&self, page: u32) -> String {
        format!("/bundle/download/{}?page={}", self.0, page)
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog link from the listing page
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub href: String,
}

/// Resolves a free-text catalog name to its identifier
///
/// # Errors
///
/// * `ScrapeError::CatalogNotFound` - No catalog name contains `name`
/// * `ScrapeError::CatalogAmbiguous` - Several catalog names contain `name`
/// * `ScrapeError::Extract` - The single match links somewhere unexpected
pub async fn resolve(session: &SessionClient, name: &str) -> crate::Result<CatalogId> {
    let document = session.fetch(CATALOG_LIST_PATH).await?;
    let entries = list_catalogs(&document);
    tracing::debug!("Found {} catalogs on {}", entries.len(), document.url());

    select_catalog(name, entries)
}

/// Every catalog link on the listing page, in page order
pub fn list_catalogs(document: &PageDocument) -> Vec<CatalogEntry> {
    let html = document.parse();
    Node::root(&html)
        .select_all(&CATALOG_LINK_SELECTOR)
        .into_iter()
        .filter_map(|link| {
            Some(CatalogEntry {
                name: link.text(),
                href: link.attr("href")?.to_string(),
            })
        })
        .collect()
}

fn select_catalog(name: &str, entries: Vec<CatalogEntry>) -> crate::Result<CatalogId> {
    let mut matches: Vec<CatalogEntry> = entries
        .into_iter()
        .filter(|entry| entry.name.contains(name))
        .collect();

    match matches.len() {
        0 => Err(ScrapeError::CatalogNotFound {
            name: name.to_string(),
        }),
        1 => {
            let entry = matches.remove(0);
            let id = catalog_id_from_href(&entry.href)?;
            tracing::info!("Catalog '{}' resolved to {}", entry.name, id);
            Ok(id)
        }
        _ => Err(ScrapeError::CatalogAmbiguous {
            name: name.to_string(),
            candidates: matches.into_iter().map(|entry| entry.name).collect(),
        }),
    }
}

/// Pulls the identifier out of a catalog download link
pub fn catalog_id_from_href(href: &str) -> Result<CatalogId, ExtractError> {
    CATALOG_ID_REGEX
        .captures(href)
        .and_then(|captures| captures.get(1))
        .map(|id| CatalogId::new(id.as_str()))
        .ok_or_else(|| ExtractError::MalformedLink(href.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry {
                name: "Bundle for Racial Justice and Equality".to_string(),
                href: "/bundle/download/abc-123_X".to_string(),
            },
            CatalogEntry {
                name: "Indie Bundle for Palestinian Aid".to_string(),
                href: "https://itch.io/bundle/download/pal_456".to_string(),
            },
            CatalogEntry {
                name: "Bundle for Ukraine".to_string(),
                href: "/somewhere/else".to_string(),
            },
        ]
    }

    #[test]
    fn test_unique_match_resolves() {
        let id = select_catalog("Racial", entries()).unwrap();
        assert_eq!(id, CatalogId::new("abc-123_X"));
        assert_eq!(id.page_path(2), "/bundle/download/abc-123_X?page=2");
    }

    #[test]
    fn test_absolute_href_resolves() {
        let id = select_catalog("Palestinian", entries()).unwrap();
        assert_eq!(id.as_str(), "pal_456");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let result = select_catalog("racial", entries());
        assert!(matches!(result, Err(ScrapeError::CatalogNotFound { .. })));
    }

    #[test]
    fn test_several_matches_are_ambiguous() {
        match select_catalog("Bundle for", entries()) {
            Err(ScrapeError::CatalogAmbiguous { candidates, .. }) => {
                assert_eq!(
                    candidates,
                    vec![
                        "Bundle for Racial Justice and Equality",
                        "Indie Bundle for Palestinian Aid",
                        "Bundle for Ukraine",
                    ]
                );
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_link_is_malformed() {
        let result = select_catalog("Ukraine", entries());
        assert!(matches!(
            result,
            Err(ScrapeError::Extract(ExtractError::MalformedLink(href))) if href == "/somewhere/else"
        ));
    }

    #[test]
    fn test_list_catalogs_reads_links() {
        let document = PageDocument::new(
            "https://itch.io/my-purchases/bundles",
            r#"<html><body>
                <section class="bundle_keys">
                  <ul>
                    <li><a href="/bundle/download/one">First   Bundle</a></li>
                    <li><a href="/bundle/download/two">Second Bundle</a></li>
                    <li><a>No link</a></li>
                  </ul>
                </section>
                <a href="/bundle/download/outside">Outside</a>
            </body></html>"#,
        );
        let catalogs = list_catalogs(&document);
        assert_eq!(catalogs.len(), 2);
        assert_eq!(catalogs[0].name, "First Bundle");
        assert_eq!(catalogs[1].href, "/bundle/download/two");
    }
}
