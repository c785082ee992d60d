//! Offset pagination envelope shared by every listing.

use serde::{Deserialize, Serialize};

/// `skip`/`limit` window requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub skip: usize,
    pub limit: usize,
}

impl PageRequest {
    /// A window with `limit` clamped to `1..=max_limit`.
    #[must_use]
    pub fn new(skip: usize, limit: usize, max_limit: usize) -> Self {
        Self { skip, limit: limit.clamp(1, max_limit.max(1)) }
    }

    /// 1-based page number: `skip / limit + 1`.
    #[must_use]
    pub const fn page_number(&self) -> usize {
        (self.skip / self.effective_limit()).saturating_add(1)
    }

    /// `ceil(total / limit)`, zero when `total` is zero.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.effective_limit() as u64)
    }

    /// Whether rows remain after this window.
    #[must_use]
    pub const fn has_more(&self, total: u64) -> bool {
        (self.end() as u64) < total
    }

    /// Offset of the following window, if any.
    #[must_use]
    pub const fn next_skip(&self, total: u64) -> Option<usize> {
        if self.has_more(total) { Some(self.end()) } else { None }
    }

    const fn end(&self) -> usize {
        self.skip.saturating_add(self.limit)
    }

    const fn effective_limit(&self) -> usize {
        if self.limit == 0 { 1 } else { self.limit }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page_number(),
            per_page: request.limit,
            total_pages: request.total_pages(total),
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
