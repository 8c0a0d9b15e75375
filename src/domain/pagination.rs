//! List pagination: normalization of caller input and page arithmetic.

/// Largest page size a caller may request; also the default.
pub const MAX_LIMIT: u64 = 100;

/// Normalized `(limit, page)` pair handed to the stores.
///
/// Stores apply these values literally (`LIMIT limit OFFSET (page-1)*limit`);
/// all bounds checking happens in [`Pagination::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Rows per page, in `1..=MAX_LIMIT`.
    pub limit: u64,
    /// 1-indexed page number.
    pub page: u64,
}

impl Pagination {
    /// Clamps raw caller input.
    ///
    /// A limit that is `<= 0` or `>= 100` becomes 100; a page `<= 0`
    /// becomes 1.
    #[must_use]
    pub fn normalize(limit: i64, page: i64) -> Self {
        let limit = match u64::try_from(limit) {
            Ok(l) if l > 0 && l < MAX_LIMIT => l,
            _ => MAX_LIMIT,
        };
        let page = match u64::try_from(page) {
            Ok(p) if p > 0 => p,
            _ => 1,
        };
        Self { limit, page }
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Page count reported to clients: `count / limit`, truncating.
    ///
    /// A trailing partial page is not counted (`5 / 100 == 0`); clients
    /// depend on this arithmetic.
    #[must_use]
    pub const fn total_page(&self, count: u64) -> u64 {
        count / self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: MAX_LIMIT,
            page: 1,
        }
    }
}
