use tracing::debug;

use super::schema::CollectionSchema;
use super::spec::{CompareOp, FieldFilter, Projection, QuerySpec, SortDirection, SortKey};
use super::{FilterPolicy, QueryError, QueryOptions, QueryParams};
use crate::pagination::PageWindow;

/// Keys that shape the read instead of filtering it.
pub const RESERVED_KEYS: [&str; 4] = ["page", "limit", "sort", "fields"];

/// Builds a [`QuerySpec`] from untrusted query parameters, one feature at a
/// time:
///
/// ```ignore
/// let spec = QueryFeatures::new(&params, &PRODUCT_SCHEMA, options)
///     .filter()?
///     .sort()?
///     .limit_fields()?
///     .paginate()
///     .build();
/// ```
///
/// A step that is skipped leaves the schema default in place (newest-first
/// order, hidden fields excluded, first page of the default size), so the
/// result is always a bounded read.
#[derive(Debug)]
pub struct QueryFeatures<'a> {
    params: &'a QueryParams,
    schema: &'a CollectionSchema,
    options: QueryOptions,
    spec: QuerySpec,
}

impl<'a> QueryFeatures<'a> {
    pub fn new(params: &'a QueryParams, schema: &'a CollectionSchema, options: QueryOptions) -> Self {
        let sort = schema
            .field(schema.default_sort_field)
            .map(|def| SortKey {
                field: def.name,
                kind: def.kind,
                direction: SortDirection::Descending,
            })
            .into_iter()
            .collect();

        let spec = QuerySpec {
            filters: Vec::new(),
            sort,
            projection: schema.default_projection(),
            page: PageWindow::resolve(None, None, options.default_limit, options.max_limit),
        };

        Self {
            params,
            schema,
            options,
            spec,
        }
    }

    /// Turns every non-reserved parameter into an equality (`field=value`)
    /// or range (`field[gte]=value`) constraint.
    pub fn filter(mut self) -> Result<Self, QueryError> {
        let mut filters = Vec::new();

        for (key, raw) in self
            .params
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        {
            match parse_filter(self.schema, key, raw) {
                Ok(filter) => filters.push(filter),
                Err(err) => self.reject(err)?,
            }
        }

        self.spec.filters = filters;
        Ok(self)
    }

    /// `sort=-price,name`: comma-separated fields, `-` for descending.
    pub fn sort(mut self) -> Result<Self, QueryError> {
        let Some(raw) = self.params.get("sort") else {
            return Ok(self);
        };

        let mut keys: Vec<SortKey> = Vec::new();
        for token in split_list(raw) {
            let (name, direction) = match token.strip_prefix('-') {
                Some(name) => (name, SortDirection::Descending),
                None => (token, SortDirection::Ascending),
            };

            match self.schema.field(name).filter(|def| def.kind.is_sortable()) {
                Some(def) if keys.iter().any(|key| key.field == def.name) => {}
                Some(def) => keys.push(SortKey {
                    field: def.name,
                    kind: def.kind,
                    direction,
                }),
                None => self.reject(QueryError::Validation(format!(
                    "Cannot sort {} by '{}'",
                    self.schema.name, name
                )))?,
            }
        }

        if !keys.is_empty() {
            self.spec.sort = keys;
        }
        Ok(self)
    }

    /// `fields=name,price` keeps only those fields; `fields=-description`
    /// drops them.
    pub fn limit_fields(mut self) -> Result<Self, QueryError> {
        let Some(raw) = self.params.get("fields") else {
            return Ok(self);
        };

        let mut include: Vec<&'static str> = Vec::new();
        let mut exclude: Vec<&'static str> = self.schema.hidden_fields.to_vec();
        let mut excluded_any = false;

        for token in split_list(raw) {
            let (name, excluded) = match token.strip_prefix('-') {
                Some(name) => (name, true),
                None => (token, false),
            };

            let Some(def) = self.schema.field(name) else {
                self.reject(QueryError::Validation(format!(
                    "Unknown field '{}' on {}",
                    name, self.schema.name
                )))?;
                continue;
            };

            let target = if excluded {
                excluded_any = true;
                &mut exclude
            } else {
                &mut include
            };
            if !target.contains(&def.name) {
                target.push(def.name);
            }
        }

        if !include.is_empty() {
            if excluded_any {
                self.reject(QueryError::Validation(
                    "Cannot mix included and excluded fields".to_string(),
                ))?;
            }
            self.spec.projection = Projection::Include(include);
        } else if excluded_any {
            self.spec.projection = Projection::Exclude(exclude);
        }

        Ok(self)
    }

    /// `page` and `limit` into an offset window, clamped to the configured
    /// ceiling.
    pub fn paginate(mut self) -> Self {
        self.spec.page = PageWindow::resolve(
            self.params.get("page").map(String::as_str),
            self.params.get("limit").map(String::as_str),
            self.options.default_limit,
            self.options.max_limit,
        );
        self
    }

    pub fn build(self) -> QuerySpec {
        self.spec
    }

    fn reject(&self, err: QueryError) -> Result<(), QueryError> {
        match self.options.policy {
            FilterPolicy::Strict => Err(err),
            FilterPolicy::Permissive => {
                debug!(collection = self.schema.name, reason = %err, "Dropping query parameter");
                Ok(())
            }
        }
    }
}

/// Runs every feature in the usual order.
pub fn build_query_spec(
    params: &QueryParams,
    schema: &CollectionSchema,
    options: QueryOptions,
) -> Result<QuerySpec, QueryError> {
    Ok(QueryFeatures::new(params, schema, options)
        .filter()?
        .sort()?
        .limit_fields()?
        .paginate()
        .build())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|token| !token.is_empty())
}

fn parse_filter(schema: &CollectionSchema, key: &str, raw: &str) -> Result<FieldFilter, QueryError> {
    let (name, op) = match key.split_once('[') {
        Some((name, rest)) => {
            let suffix = rest.strip_suffix(']').ok_or_else(|| {
                QueryError::Validation(format!("Malformed filter key '{}'", key))
            })?;
            let op = CompareOp::from_suffix(suffix).ok_or_else(|| {
                QueryError::Validation(format!("Unsupported operator '{}' on '{}'", suffix, name))
            })?;
            (name, op)
        }
        None => (key, CompareOp::Eq),
    };

    let def = schema
        .field(name)
        .filter(|def| def.filterable)
        .ok_or_else(|| {
            QueryError::Validation(format!("Cannot filter {} by '{}'", schema.name, name))
        })?;

    if op != CompareOp::Eq && !def.kind.supports_range() {
        return Err(QueryError::Validation(format!(
            "Range operators are not supported on '{}'",
            def.name
        )));
    }

    let value = def.kind.parse_value(raw).ok_or_else(|| {
        QueryError::Validation(format!("Invalid value '{}' for '{}'", raw, def.name))
    })?;

    Ok(FieldFilter {
        field: def.name,
        kind: def.kind,
        op,
        value,
    })
}
