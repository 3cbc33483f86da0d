//! Renders the parts of a [`QuerySpec`] onto a [`QueryBuilder`].
//!
//! Identifiers are pushed verbatim: they are the `&'static str` field names
//! of a collection schema, which double as column names. Values are always
//! bound parameters.
//!
//! [`QuerySpec`]: lestari_core::query::QuerySpec

use lestari_core::PageWindow;
use lestari_core::query::{CompareOp, FieldFilter, FieldKind, FilterValue, SortDirection, SortKey};
use sqlx::{Postgres, QueryBuilder};

/// Appends ` AND <condition>` for every filter. The builder must already
/// hold a `WHERE` clause.
pub fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[FieldFilter]) {
    for filter in filters {
        builder.push(" AND ");

        // list columns match when any element equals the value
        if filter.kind == FieldKind::TextList && filter.op == CompareOp::Eq {
            push_value(builder, &filter.value);
            builder.push(" = ANY(").push(filter.field).push(")");
            continue;
        }

        builder
            .push(filter.field)
            .push(" ")
            .push(filter.op.as_sql())
            .push(" ");
        push_value(builder, &filter.value);
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => builder.push_bind(text.clone()),
        FilterValue::Number(number) => builder.push_bind(*number),
        FilterValue::Boolean(flag) => builder.push_bind(*flag),
        FilterValue::Timestamp(ts) => builder.push_bind(*ts),
        FilterValue::Uuid(id) => builder.push_bind(*id),
    };
}

/// Appended after the requested keys, oldest first.
const TIEBREAK_COLUMNS: [&str; 2] = ["created_at", "id"];

/// Appends ` ORDER BY ...`. Nulls sort as the smallest value. Requested
/// keys are followed by `created_at ASC, id ASC` unless already named.
pub fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }

    builder.push(" ORDER BY ");
    let mut separated = builder.separated(", ");
    for key in sort {
        let nulls = match key.direction {
            SortDirection::Ascending => "NULLS FIRST",
            SortDirection::Descending => "NULLS LAST",
        };
        separated.push(format!("{} {} {}", key.field, key.direction.as_sql(), nulls));
    }

    for column in TIEBREAK_COLUMNS {
        if !sort.iter().any(|key| key.field == column) {
            separated.push(format!("{} ASC", column));
        }
    }
}

pub fn push_page_window(builder: &mut QueryBuilder<'_, Postgres>, page: &PageWindow) {
    builder
        .push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
}
