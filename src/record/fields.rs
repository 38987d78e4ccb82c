use crate::consts::OUTPUT_DATETIME_FORMAT;
use crate::record::DetailBlock;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// The shape of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Count,
    Integer,
    Float,
    DateTime,
    List,
    Set,
    Pairs,
    Details,
}

/// A value produced by an extractor, tagged with its shape
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Count(u32),
    Integer(Option<u64>),
    Float(Option<f64>),
    DateTime(Option<NaiveDateTime>),
    /// Ordered, duplicates kept
    List(Vec<String>),
    Set(BTreeSet<String>),
    Pairs(BTreeSet<(String, String)>),
    Details(Box<DetailBlock>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Count(_) => FieldKind::Count,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::DateTime(_) => FieldKind::DateTime,
            Self::List(_) => FieldKind::List,
            Self::Set(_) => FieldKind::Set,
            Self::Pairs(_) => FieldKind::Pairs,
            Self::Details(_) => FieldKind::Details,
        }
    }
}

/// One declared field of a record type
///
/// `assign` is only ever called with a value whose kind equals `kind`.
pub struct FieldSpec<R> {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Overrides the name derived by [`friendly_name`]
    pub display_name: Option<&'static str>,
    /// Hidden fields are assembled but not written out
    pub visible: bool,
    pub assign: fn(&mut R, FieldValue),
    pub format: fn(&R) -> String,
}

impl<R> FieldSpec<R> {
    pub fn display_name(&self) -> String {
        self.display_name
            .map(str::to_string)
            .unwrap_or_else(|| friendly_name(self.name))
    }
}

/// A record type that can be assembled from a build plan
pub trait Buildable: Default + 'static {
    /// Declared fields, in declaration order
    fn fields() -> &'static [FieldSpec<Self>];
}

/// Declares a [`FieldSpec`] for a struct field whose type is the payload of
/// the `FieldValue` variant of the same name as `$kind`.
macro_rules! field_spec {
    ($record:ty, $field:ident, hidden $kind:ident) => {
        $crate::record::FieldSpec {
            name: stringify!($field),
            kind: $crate::record::FieldKind::$kind,
            display_name: None,
            visible: false,
            assign: |record: &mut $record, value: $crate::record::FieldValue| {
                if let $crate::record::FieldValue::$kind(inner) = value {
                    record.$field = *inner;
                }
            },
            format: |_: &$record| String::new(),
        }
    };
    ($record:ty, $field:ident, $kind:ident, $format:expr) => {
        $crate::record::field_spec!($record, $field, $kind, $format, None)
    };
    ($record:ty, $field:ident, $kind:ident, $format:expr, $display:expr) => {
        $crate::record::FieldSpec {
            name: stringify!($field),
            kind: $crate::record::FieldKind::$kind,
            display_name: $display,
            visible: true,
            assign: |record: &mut $record, value: $crate::record::FieldValue| {
                if let $crate::record::FieldValue::$kind(inner) = value {
                    record.$field = inner;
                }
            },
            format: |record: &$record| ($format)(&record.$field),
        }
    };
}

pub(crate) use field_spec;

/// Column title derived from a field name: `number_of_ratings` → `Number of ratings`
pub fn friendly_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display names of the visible fields of `R`, in declaration order
pub fn display_names<R: Buildable>() -> Vec<String> {
    R::fields()
        .iter()
        .filter(|spec| spec.visible)
        .map(FieldSpec::display_name)
        .collect()
}

/// Formatted values of the visible fields of `record`, in declaration order
pub fn display_values<R: Buildable>(record: &R) -> Vec<String> {
    R::fields()
        .iter()
        .filter(|spec| spec.visible)
        .map(|spec| (spec.format)(record))
        .collect()
}

pub fn format_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn format_optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub fn format_datetime(value: &Option<NaiveDateTime>) -> String {
    value
        .map(|datetime| datetime.format(OUTPUT_DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn join_comma<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn join_lines<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `label: href` per link, one per line
pub fn format_links(links: &BTreeSet<(String, String)>) -> String {
    links
        .iter()
        .map(|(label, href)| format!("{}: {}", label, href))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_friendly_name() {
        assert_eq!(friendly_name("title"), "Title");
        assert_eq!(friendly_name("number_of_ratings"), "Number of ratings");
        assert_eq!(friendly_name("operating_systems"), "Operating systems");
        assert_eq!(friendly_name(""), "");
    }

    #[test]
    fn test_format_absent_values_as_empty() {
        assert_eq!(format_text(&None), "");
        assert_eq!(format_optional::<f64>(&None), "");
        assert_eq!(format_datetime(&None), "");
    }

    #[test]
    fn test_format_datetime() {
        let datetime = NaiveDate::from_ymd_opt(2020, 6, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(format_datetime(&Some(datetime)), "2020-06-05 14:30");
    }

    #[test]
    fn test_joiners() {
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(join_comma(&names), "Alice, Bob");
        assert_eq!(join_lines(&names), "Alice\nBob");

        let links: BTreeSet<_> = [
            ("Homepage".to_string(), "https://a.example".to_string()),
            ("Discord".to_string(), "https://d.example".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            format_links(&links),
            "Discord: https://d.example\nHomepage: https://a.example"
        );
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(FieldValue::Count(3).kind(), FieldKind::Count);
        assert_eq!(FieldValue::Text(None).kind(), FieldKind::Text);
        assert_eq!(FieldValue::Set(BTreeSet::new()).kind(), FieldKind::Set);
    }
}
