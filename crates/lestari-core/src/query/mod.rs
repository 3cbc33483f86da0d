//! Query feature builder.
//!
//! Translates untrusted query parameters into a [`QuerySpec`]: equality and
//! range filters, sort order, field projection and a page window. Only
//! fields declared in a [`CollectionSchema`] and the operators `gte`, `gt`,
//! `lte`, `lt` are ever admitted. What happens to anything else depends on
//! the [`FilterPolicy`].
//!
//! The builder performs no I/O; executing a [`QuerySpec`] is the storage layer's
//! job.

mod builder;
mod schema;
mod spec;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::errors::AppError;
use crate::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

pub use builder::{QueryFeatures, RESERVED_KEYS, build_query_spec};
pub use schema::{CollectionSchema, FieldDef, FieldKind};
pub use spec::{
    CompareOp, FieldFilter, FilterValue, Projection, QuerySpec, SortDirection, SortKey,
};

/// Raw query parameters. Ordered, so building from the same parameters
/// always yields the same spec.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::bad_request(err)
    }
}

/// What to do with parameters that name unknown fields or operators, or
/// carry values that do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Drop the offending parameter and carry on.
    #[default]
    Permissive,
    /// Fail with [`QueryError::Validation`].
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub policy: FilterPolicy,
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            policy: FilterPolicy::Permissive,
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}
