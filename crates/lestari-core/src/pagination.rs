//! Page window resolution for collection reads.
//!
//! Collection endpoints accept `page` (1-indexed) and `limit` as raw query
//! strings. [`PageWindow::resolve`] turns them into a bounded window:
//!
//! - `page` defaults to 1 and is clamped to a minimum of 1
//! - `limit` defaults to the configured default and is clamped to
//!   `[1, max_limit]`
//! - `offset = (page - 1) * limit`
//!
//! Unparsable or empty values fall back to the defaults rather than failing
//! the request.
//!
//! # Example
//!
//! ```ignore
//! // GET /api/products?page=3&limit=20
//! let window = PageWindow::resolve(Some("3"), Some("20"), 100, 100);
//! assert_eq!(window.offset, 40);
//! ```

use serde::Serialize;
use utoipa::ToSchema;

/// Limit applied when the request does not name one.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;
/// Hard ceiling on `limit`, so a single request can never read an unbounded
/// number of documents.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A resolved page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct PageWindow {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Maximum items returned
    pub limit: i64,
    /// Number of items skipped
    pub offset: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

impl PageWindow {
    /// Builds a window from already-validated values.
    #[must_use]
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }

    /// Resolves raw `page` / `limit` query values against the configured
    /// default and ceiling.
    #[must_use]
    pub fn resolve(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        let max_limit = max_limit.max(1);
        let page = parse_i64(page).unwrap_or(1).max(1);
        let limit = parse_i64(limit)
            .unwrap_or(default_limit)
            .clamp(1, max_limit);

        Self::new(page, limit)
    }
}

fn parse_i64(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}
