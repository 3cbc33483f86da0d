//! Collection schemas: the allow-list the query builder resolves names
//! against.
//!
//! Every field name that ends up in a [`super::QuerySpec`] is a
//! `&'static str` borrowed from a [`CollectionSchema`], never from the
//! request, so executors can render identifiers without escaping.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::spec::{FilterValue, Projection};

/// How a field's raw query value is parsed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    /// A list of strings; equality matches any element.
    TextList,
    Number,
    Boolean,
    Timestamp,
    Uuid,
}

impl FieldKind {
    /// Whether `gte`/`gt`/`lte`/`lt` make sense for this kind.
    pub fn supports_range(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Timestamp)
    }

    pub fn is_sortable(self) -> bool {
        !matches!(self, FieldKind::TextList)
    }

    /// Parses a raw query value. Returns `None` when the value does not fit
    /// the kind.
    pub fn parse_value(self, raw: &str) -> Option<FilterValue> {
        match self {
            FieldKind::Text | FieldKind::TextList => Some(FilterValue::Text(raw.to_string())),
            FieldKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FilterValue::Number),
            FieldKind::Boolean => match raw.trim() {
                "true" => Some(FilterValue::Boolean(true)),
                "false" => Some(FilterValue::Boolean(false)),
                _ => None,
            },
            FieldKind::Timestamp => parse_timestamp(raw.trim()).map(FilterValue::Timestamp),
            FieldKind::Uuid => Uuid::parse_str(raw.trim()).ok().map(FilterValue::Uuid),
        }
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether the field may appear as a filter key. Non-filterable fields
    /// can still be sorted on and projected.
    pub filterable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            filterable: true,
        }
    }

    pub const fn unfilterable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            filterable: false,
        }
    }
}

/// Declares what a collection exposes to query parameters.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
    /// Creation timestamp; results are newest-first on this field when the
    /// request names no order.
    pub default_sort_field: &'static str,
    /// Internal fields left out of responses unless explicitly requested.
    pub hidden_fields: &'static [&'static str],
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The projection applied when a request names no fields.
    pub fn default_projection(&self) -> Projection {
        Projection::Exclude(self.hidden_fields.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_number_parsing() {
        assert_eq!(
            FieldKind::Number.parse_value("100"),
            Some(FilterValue::Number(100.0))
        );
        assert_eq!(
            FieldKind::Number.parse_value(" 12.5 "),
            Some(FilterValue::Number(12.5))
        );
        assert_eq!(FieldKind::Number.parse_value("murah"), None);
        assert_eq!(FieldKind::Number.parse_value("NaN"), None);
        assert_eq!(FieldKind::Number.parse_value("inf"), None);
    }

    #[test]
    fn test_boolean_parsing() {
        assert_eq!(
            FieldKind::Boolean.parse_value("true"),
            Some(FilterValue::Boolean(true))
        );
        assert_eq!(FieldKind::Boolean.parse_value("yes"), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FieldKind::Timestamp.parse_value("2024-05-01"),
            Some(FilterValue::Timestamp(expected))
        );
        assert_eq!(
            FieldKind::Timestamp.parse_value("2024-05-01T07:00:00+07:00"),
            Some(FilterValue::Timestamp(expected))
        );
        assert_eq!(FieldKind::Timestamp.parse_value("yesterday"), None);
    }

    #[test]
    fn test_uuid_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(
            FieldKind::Uuid.parse_value(&id.to_string()),
            Some(FilterValue::Uuid(id))
        );
        assert_eq!(FieldKind::Uuid.parse_value("42"), None);
    }

    #[test]
    fn test_range_support() {
        assert!(FieldKind::Number.supports_range());
        assert!(FieldKind::Timestamp.supports_range());
        assert!(!FieldKind::Text.supports_range());
        assert!(!FieldKind::Boolean.supports_range());
        assert!(!FieldKind::TextList.is_sortable());
    }
}
