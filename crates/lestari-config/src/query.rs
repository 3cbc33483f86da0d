//! Limits for collection reads.
//!
//! - `QUERY_DEFAULT_LIMIT`: page size when the request names none (default 100)
//! - `QUERY_MAX_LIMIT`: ceiling on `limit` (default 100)
//! - `QUERY_STRICT_FILTERS`: reject unknown filter fields, operators and
//!   unparsable values with a 400 instead of dropping them (default off)

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub strict_filters: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 100,
            strict_filters: false,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_limit = crate::env::parse_or("QUERY_MAX_LIMIT", defaults.max_limit).max(1);
        let default_limit = crate::env::parse_or("QUERY_DEFAULT_LIMIT", defaults.default_limit)
            .clamp(1, max_limit);

        Self {
            default_limit,
            max_limit,
            strict_filters: crate::env::flag("QUERY_STRICT_FILTERS"),
        }
    }
}
