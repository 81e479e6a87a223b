//! Pagination for list endpoints.
//!
//! A handler returns a `SearchResult`; the envelope layer turns it into a
//! bare JSON list plus `Link`, `X-Total-Count` and `X-Limit` headers.

use serde::{Deserialize, Serialize};

/// One page of a larger collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult<T> {
    /// Items on this page.
    pub list: Vec<T>,
    /// Number of items in the whole collection.
    pub total_count: usize,
    /// Page size that was applied.
    pub limit: usize,
    /// Offset of the first item of this page.
    pub offset: usize,
}

impl<T> SearchResult<T> {
    /// Offset of the next page, or `None` when this page reaches the end.
    pub fn next_offset(&self) -> Option<usize> {
        next_offset(self.offset, self.limit, self.total_count)
    }

    /// Transform every item.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResult<U> {
        SearchResult {
            list: self.list.into_iter().map(f).collect(),
            total_count: self.total_count,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<T: Clone> SearchResult<T> {
    /// Slice a full collection into the requested page.
    pub fn from_slice(all: &[T], params: PaginationParams) -> Self {
        let start = params.offset.min(all.len());
        let end = start.saturating_add(params.limit).min(all.len());
        Self {
            list: all[start..end].to_vec(),
            total_count: all.len(),
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// `offset + limit` when more items remain after the page.
pub fn next_offset(offset: usize, limit: usize, total_count: usize) -> Option<usize> {
    let next = offset.saturating_add(limit);
    (limit > 0 && next < total_count).then_some(next)
}

/// Effective `offset` / `limit` for a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// Items to skip.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
}

impl PaginationParams {
    /// Resolve raw query values against the server's default and maximum.
    ///
    /// A missing limit falls back to `default_limit`; a limit above
    /// `max_limit` is clamped.
    pub fn resolve(
        offset: Option<usize>,
        limit: Option<usize>,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(default_limit).min(max_limit),
        }
    }
}
