//! Item extraction
//!
//! This module turns markup into records:
//! - `entry` reads one catalog row and drives the detail fetch
//! - `detail` reads an item's own page into a [`DetailBlock`](crate::DetailBlock)
//! - `url` canonicalizes item links

mod detail;
mod entry;
mod url;

pub use detail::{DetailContext, DetailExtractor, DETAIL_PLAN};
pub use entry::{EntryContext, EntryExtractor, ENTRY_PLAN, FULL_ENTRY_PLAN};
pub use url::canonical_item_url;
