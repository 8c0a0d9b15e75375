//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for list endpoints.
///
/// Values are taken as-is; out-of-range input is clamped by the service
/// (limit to 100, page to 1) rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive name filter.
    #[serde(default)]
    pub keyword: Option<String>,
    /// Entities per page (1-99; anything else means 100).
    #[serde(default)]
    pub limit: i64,
    /// 1-indexed page number (`<= 0` means 1).
    #[serde(default)]
    pub page: i64,
}

impl ListParams {
    /// Trimmed keyword, empty when absent.
    #[must_use]
    pub fn keyword(&self) -> String {
        self.keyword.as_deref().map(str::trim).unwrap_or_default().to_string()
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Items per page after normalization.
    pub limit: u64,
    /// Current page after normalization.
    pub page: u64,
    /// `total / limit`, truncating.
    pub total_page: u64,
}

/// Request body carrying an entity name, used by create and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NamePayload {
    /// Entity name; must not be blank.
    #[serde(default)]
    pub name: String,
}
