//! The composed read specification and its in-process evaluation.
//!
//! Storage backends either render a [`QuerySpec`] to their native query
//! language (see `lestari-db`) or evaluate it directly over serialized
//! documents with [`QuerySpec::execute`].

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{FieldKind, parse_timestamp};
use crate::pagination::PageWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl CompareOp {
    /// Maps a `field[op]` suffix to an operator. Only the range operators
    /// are addressable by suffix; equality is the bare `field=value` form.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(CompareOp::Gte),
            "gt" => Some(CompareOp::Gt),
            "lte" => Some(CompareOp::Lte),
            "lt" => Some(CompareOp::Lt),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Lt => "<",
        }
    }

    /// Whether `document_value <op> filter_value` holds, given
    /// `document_value.cmp(filter_value)`.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
        }
    }
}

/// A typed filter operand, parsed according to the field's [`FieldKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl FilterValue {
    /// Orders a JSON document value relative to this operand. `None` means
    /// the two are not comparable (missing, null, or of another type).
    fn compare_document(&self, doc: &Value) -> Option<Ordering> {
        match self {
            FilterValue::Text(expected) => doc.as_str().map(|s| s.cmp(expected.as_str())),
            FilterValue::Number(expected) => doc.as_f64().and_then(|n| n.partial_cmp(expected)),
            FilterValue::Boolean(expected) => doc.as_bool().map(|b| b.cmp(expected)),
            FilterValue::Timestamp(expected) => doc
                .as_str()
                .and_then(parse_timestamp)
                .map(|ts| ts.cmp(expected)),
            FilterValue::Uuid(expected) => doc
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(|id| id.cmp(expected)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: &'static str,
    pub kind: FieldKind,
    pub op: CompareOp,
    pub value: FilterValue,
}

impl FieldFilter {
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(actual) = doc.get(self.field) else {
            return false;
        };

        if let (FieldKind::TextList, Value::Array(items)) = (self.kind, actual) {
            return items.iter().any(|item| {
                self.value
                    .compare_document(item)
                    .is_some_and(|ord| self.op.holds(ord))
            });
        }

        self.value
            .compare_document(actual)
            .is_some_and(|ord| self.op.holds(ord))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: &'static str,
    pub kind: FieldKind,
    pub direction: SortDirection,
}

impl SortKey {
    /// Missing and null values sort before everything else in ascending
    /// order.
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let a = a.get(self.field).filter(|v| !v.is_null());
        let b = b.get(self.field).filter(|v| !v.is_null());

        let ordering = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => compare_values(self.kind, a, b),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

fn compare_values(kind: FieldKind, a: &Value, b: &Value) -> Ordering {
    let ordering = match kind {
        FieldKind::Number => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        FieldKind::Boolean => a.as_bool().zip(b.as_bool()).map(|(a, b)| a.cmp(&b)),
        FieldKind::Timestamp => a
            .as_str()
            .and_then(parse_timestamp)
            .zip(b.as_str().and_then(parse_timestamp))
            .map(|(a, b)| a.cmp(&b)),
        FieldKind::Text | FieldKind::TextList | FieldKind::Uuid => {
            a.as_str().zip(b.as_str()).map(|(a, b)| a.cmp(b))
        }
    };
    ordering.unwrap_or(Ordering::Equal)
}

/// Which fields a response carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these fields.
    Include(Vec<&'static str>),
    /// Everything except these fields.
    Exclude(Vec<&'static str>),
}

impl Projection {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            Projection::Include(fields) => fields.contains(&field),
            Projection::Exclude(fields) => !fields.contains(&field),
        }
    }

    /// Drops the fields this projection leaves out. Non-object values are
    /// returned unchanged.
    pub fn apply(&self, doc: Value) -> Value {
        match doc {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| self.includes(key))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// A validated, composed description of a filtered, sorted, projected and
/// paginated read.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<FieldFilter>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: PageWindow,
}

impl QuerySpec {
    /// Adds a server-side constraint (e.g. scoping a listing to one seller)
    /// on top of whatever the request asked for.
    #[must_use]
    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        self.sort
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Evaluates filters, ordering and the page window over in-memory
    /// documents. Projection is left to the caller, since it changes the
    /// document shape.
    pub fn execute<T: Serialize>(&self, docs: Vec<T>) -> Result<Vec<T>, serde_json::Error> {
        let mut rows = docs
            .into_iter()
            .map(|doc| serde_json::to_value(&doc).map(|value| (value, doc)))
            .collect::<Result<Vec<_>, _>>()?;

        rows.retain(|(value, _)| self.matches(value));
        rows.sort_by(|(a, _), (b, _)| self.compare(a, b));

        let offset = usize::try_from(self.page.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.page.limit).unwrap_or(0);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, doc)| doc)
            .collect())
    }

    /// Serializes a document and applies the projection.
    pub fn project<T: Serialize>(&self, doc: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(doc).map(|value| self.projection.apply(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn price_filter(op: CompareOp, value: f64) -> FieldFilter {
        FieldFilter {
            field: "price",
            kind: FieldKind::Number,
            op,
            value: FilterValue::Number(value),
        }
    }

    fn spec(filters: Vec<FieldFilter>, sort: Vec<SortKey>, page: PageWindow) -> QuerySpec {
        QuerySpec {
            filters,
            sort,
            projection: Projection::Exclude(vec!["version"]),
            page,
        }
    }

    #[test]
    fn test_compare_op_holds() {
        assert!(CompareOp::Gte.holds(Ordering::Equal));
        assert!(CompareOp::Gte.holds(Ordering::Greater));
        assert!(!CompareOp::Gt.holds(Ordering::Equal));
        assert!(CompareOp::Lte.holds(Ordering::Less));
        assert!(!CompareOp::Lt.holds(Ordering::Equal));
        assert!(CompareOp::Eq.holds(Ordering::Equal));
    }

    #[test]
    fn test_unknown_suffix_is_not_an_operator() {
        assert_eq!(CompareOp::from_suffix("gte"), Some(CompareOp::Gte));
        assert_eq!(CompareOp::from_suffix("ne"), None);
        assert_eq!(CompareOp::from_suffix("regex"), None);
        assert_eq!(CompareOp::from_suffix("eq"), None);
    }

    #[test]
    fn test_range_filter_matches() {
        let filter = price_filter(CompareOp::Gte, 100.0);
        assert!(filter.matches(&json!({"price": 100})));
        assert!(filter.matches(&json!({"price": 250.5})));
        assert!(!filter.matches(&json!({"price": 99.99})));
        assert!(!filter.matches(&json!({"price": null})));
        assert!(!filter.matches(&json!({"name": "kopi"})));
    }

    #[test]
    fn test_text_list_equality_matches_any_element() {
        let filter = FieldFilter {
            field: "tags",
            kind: FieldKind::TextList,
            op: CompareOp::Eq,
            value: FilterValue::Text("organik".to_string()),
        };
        assert!(filter.matches(&json!({"tags": ["lokal", "organik"]})));
        assert!(!filter.matches(&json!({"tags": ["lokal"]})));
        assert!(!filter.matches(&json!({"tags": []})));
    }

    #[test]
    fn test_timestamp_filter_compares_instants() {
        let filter = FieldFilter {
            field: "created_at",
            kind: FieldKind::Timestamp,
            op: CompareOp::Lt,
            value: FilterValue::Timestamp(parse_timestamp("2024-01-01").unwrap()),
        };
        assert!(filter.matches(&json!({"created_at": "2023-12-31T23:59:59.123456Z"})));
        assert!(!filter.matches(&json!({"created_at": "2024-01-01T00:00:00Z"})));
    }

    #[test]
    fn test_compare_uses_keys_in_order() {
        let spec = spec(
            vec![],
            vec![
                SortKey {
                    field: "price",
                    kind: FieldKind::Number,
                    direction: SortDirection::Descending,
                },
                SortKey {
                    field: "name",
                    kind: FieldKind::Text,
                    direction: SortDirection::Ascending,
                },
            ],
            PageWindow::default(),
        );

        let a = json!({"price": 10, "name": "b"});
        let b = json!({"price": 10, "name": "a"});
        let c = json!({"price": 20, "name": "z"});

        assert_eq!(spec.compare(&c, &a), Ordering::Less);
        assert_eq!(spec.compare(&b, &a), Ordering::Less);
        assert_eq!(spec.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_timestamp_sort_is_not_lexicographic() {
        let key = SortKey {
            field: "created_at",
            kind: FieldKind::Timestamp,
            direction: SortDirection::Ascending,
        };
        let earlier = json!({"created_at": "2024-01-01T00:00:00Z"});
        let later = json!({"created_at": "2024-01-01T00:00:00.500Z"});
        assert_eq!(key.compare(&earlier, &later), Ordering::Less);
    }

    #[test]
    fn test_missing_values_sort_first_ascending() {
        let key = SortKey {
            field: "discount_price",
            kind: FieldKind::Number,
            direction: SortDirection::Ascending,
        };
        let missing = json!({"discount_price": null});
        let present = json!({"discount_price": 5});
        assert_eq!(key.compare(&missing, &present), Ordering::Less);
    }

    #[test]
    fn test_projection_apply() {
        let doc = json!({"name": "Kopi", "price": 50, "version": 3});

        let include = Projection::Include(vec!["name", "price"]);
        assert_eq!(include.apply(doc.clone()), json!({"name": "Kopi", "price": 50}));

        let exclude = Projection::Exclude(vec!["version"]);
        assert_eq!(exclude.apply(doc), json!({"name": "Kopi", "price": 50}));
    }

    #[test]
    fn test_execute_filters_sorts_and_windows() {
        #[derive(Serialize, Debug, PartialEq)]
        struct Item {
            name: &'static str,
            price: f64,
        }

        let docs = vec![
            Item { name: "a", price: 50.0 },
            Item { name: "b", price: 150.0 },
            Item { name: "c", price: 300.0 },
            Item { name: "d", price: 120.0 },
            Item { name: "e", price: 200.0 },
        ];

        let spec = spec(
            vec![price_filter(CompareOp::Gte, 100.0)],
            vec![SortKey {
                field: "price",
                kind: FieldKind::Number,
                direction: SortDirection::Ascending,
            }],
            PageWindow::new(2, 2),
        );

        let names: Vec<_> = spec
            .execute(docs)
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["e", "c"]);
    }

    #[test]
    fn test_with_filter_appends() {
        let base = spec(vec![], vec![], PageWindow::default());
        let scoped = base.with_filter(price_filter(CompareOp::Lt, 10.0));
        assert_eq!(scoped.filters.len(), 1);
        assert!(scoped.matches(&json!({"price": 5})));
        assert!(!scoped.matches(&json!({"price": 15})));
    }
}
