//! Typed records and the declarative machinery that assembles them
//!
//! Every record type publishes a static field table ([`FieldSpec`]) in
//! declaration order. Extraction code publishes build plans ([`BuildPlan`])
//! that bind field names to extractor functions over some context. Building a
//! record walks the record's field table, runs the bound extractor for each
//! field and leaves unbound fields at their defaults.
//!
//! The same field table doubles as the "friendly" side table used for output:
//! display names and value formatters live next to each field.

mod fields;
mod plan;
mod types;

pub(crate) use fields::field_spec;
pub use fields::{
    display_names, display_values, format_datetime, format_links, format_optional, format_text,
    friendly_name, join_comma, join_lines, Buildable, FieldKind, FieldSpec, FieldValue,
};
pub use plan::{BuildError, BuildPlan, Extractor};
pub use types::{DetailBlock, Record, PAGE_COLUMN};
