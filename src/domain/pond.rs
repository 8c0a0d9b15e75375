//! Pond entity, its farm-joined read shape, and its store query.

use super::pagination::Pagination;

/// A pond as written by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pond {
    /// Server-assigned identifier (ignored on create).
    pub id: i64,
    /// Owning farm; must exist and be non-deleted for every write.
    pub farm_id: i64,
    /// Name, unique among all non-deleted ponds regardless of farm.
    pub name: String,
}

/// A pond joined with its parent farm, as returned by every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PondWithFarm {
    /// Pond identifier.
    pub id: i64,
    /// Owning farm identifier.
    pub farm_id: i64,
    /// Owning farm name.
    pub farm_name: String,
    /// Pond name.
    pub name: String,
}

/// Filter for pond list and count operations, scoped to one farm.
#[derive(Debug, Clone, Default)]
pub struct PondQuery {
    /// Parent farm.
    pub farm_id: i64,
    /// Case-insensitive substring filter on the pond name; empty matches all.
    pub keyword: String,
    /// Normalized pagination (ignored by `count`).
    pub pagination: Pagination,
}
