//! Pond DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::PondWithFarm;

/// Public shape of a pond, including its farm's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PondResponse {
    /// Pond identifier.
    #[schema(example = 1)]
    pub id: i64,
    /// Owning farm identifier.
    #[schema(example = 1)]
    pub farm_id: i64,
    /// Owning farm name.
    #[schema(example = "Farm A")]
    pub farm_name: String,
    /// Pond name.
    #[serde(rename = "pond_name")]
    #[schema(example = "Pond A")]
    pub name: String,
}

impl From<PondWithFarm> for PondResponse {
    fn from(pond: PondWithFarm) -> Self {
        Self {
            id: pond.id,
            farm_id: pond.farm_id,
            farm_name: pond.farm_name,
            name: pond.name,
        }
    }
}

/// Paginated list response for `GET /farms/{farm_id}/ponds`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PondListResponse {
    /// Ponds on this page.
    pub ponds: Vec<PondResponse>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}
