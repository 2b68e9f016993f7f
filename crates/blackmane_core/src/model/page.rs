//! Pagination request and list envelope.

use serde::{Deserialize, Serialize};

/// Limit used when callers do not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
/// Hard upper bound for one page.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Offset/limit window over an insertion-ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of rows to skip.
    pub offset: u32,
    /// Maximum rows to return. Clamped into `[1, MAX_PAGE_LIMIT]`.
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Returns the limit actually applied to queries.
    pub fn applied_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// One page of entities plus the size of the whole filtered set.
///
/// `total` never reflects the page length; it is the count a caller would
/// get by walking every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
