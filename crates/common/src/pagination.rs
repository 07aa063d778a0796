//! Page envelope for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Pagination parameters from the query string.
///
/// Both values are coerced to at least 1 by [`PageRequest::normalized`];
/// callers that skip them get page 1 with 10 items.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    /// Clamp page and limit into their valid ranges.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.max(1).min(MAX_PAGE_LIMIT),
        }
    }

    /// Zero-based offset of the first item on this page.
    ///
    /// Saturates instead of overflowing; both values come straight from
    /// the query string.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// A window of results plus pagination metadata.
///
/// `total_items` is always the unwindowed match count; a page past the
/// end yields an empty `items` with the metadata intact, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u64,
    /// Items per page.
    pub limit: u64,
    /// Unwindowed match count.
    pub total_items: u64,
    /// Number of pages at this limit.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    /// Build a page envelope from a fetched window and the total count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let request = request.normalized();
        let total_pages = total_items.div_ceil(request.limit);

        Self {
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1 && total_pages > 0,
            items,
            page: request.page,
            limit: request.limit,
            total_items,
            total_pages,
        }
    }

    /// Map the items while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}
