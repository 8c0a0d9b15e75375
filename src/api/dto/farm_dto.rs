//! Farm DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::Farm;

/// Public shape of a farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FarmResponse {
    /// Farm identifier.
    #[schema(example = 1)]
    pub id: i64,
    /// Farm name.
    #[schema(example = "Farm A")]
    pub name: String,
}

impl From<Farm> for FarmResponse {
    fn from(farm: Farm) -> Self {
        Self {
            id: farm.id,
            name: farm.name,
        }
    }
}

/// Paginated list response for `GET /farms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FarmListResponse {
    /// Farms on this page.
    pub farms: Vec<FarmResponse>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}
