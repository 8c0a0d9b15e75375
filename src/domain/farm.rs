//! Farm entity and its store query.

use super::pagination::Pagination;

/// A non-deleted farm row as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Farm {
    /// Server-assigned identifier.
    pub id: i64,
    /// Name, unique among non-deleted farms.
    pub name: String,
}

/// Filter for farm list and count operations.
#[derive(Debug, Clone, Default)]
pub struct FarmQuery {
    /// Case-insensitive substring filter on the name; empty matches all.
    pub keyword: String,
    /// Normalized pagination (ignored by `count`).
    pub pagination: Pagination,
}
