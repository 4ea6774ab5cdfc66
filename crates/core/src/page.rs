//! Offset pagination shared by list operations.

use serde::{Deserialize, Serialize};

/// Default number of rows per page when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: u32 = 500;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_num: u32,
    pub page_size: u32,
}

impl Page {
    /// Build a page request, clamping nonsense values (0, oversized) into range.
    pub fn new(page_num: Option<u32>, page_size: Option<u32>, default_size: u32) -> Self {
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        Self {
            page_num: page_num.filter(|n| *n > 0).unwrap_or(1),
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.page_num.saturating_sub(1))
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Slice an already filtered + ordered collection (in-memory adapters).
    pub fn slice<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        rows.iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .cloned()
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub count: u64,
    pub rows: Vec<T>,
}

impl<T> Paged<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            rows: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            count: self.count,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }
}
