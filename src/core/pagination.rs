//! Offset pagination shared by every list operation.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hard cap on page size
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Page size when the client does not send one
pub const DEFAULT_PAGE_LIMIT: u64 = 25;

/// Client-supplied page request
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    /// Maximum rows to return, 1..=100
    pub limit: Option<u64>,
    /// Rows to skip
    pub offset: Option<u64>,
}

impl Page {
    /// Resolves the request to a concrete `(limit, offset)` pair.
    ///
    /// # Errors
    /// Returns a validation error for a zero or over-cap limit.
    pub fn resolve(self) -> Result<(u64, u64)> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(Error::Validation {
                field: "limit",
                message: format!("limit must be between 1 and {MAX_PAGE_LIMIT}"),
            });
        }
        Ok((limit, self.offset.unwrap_or(0)))
    }
}

/// Pagination metadata returned alongside every page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageInfo {
    /// Total matching rows
    pub total: u64,
    /// Applied limit
    pub limit: u64,
    /// Applied offset
    pub offset: u64,
    /// Whether another page exists past this one
    pub has_more: bool,
}

impl PageInfo {
    /// Builds the metadata for one page.
    #[must_use]
    pub const fn new(total: u64, limit: u64, offset: u64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}

/// One page of results plus its metadata
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// The page of rows
    pub data: Vec<T>,
    /// Page metadata
    pub pagination: PageInfo,
}
