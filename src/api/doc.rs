//! OpenAPI document served by Swagger UI.

use utoipa::OpenApi;

use crate::api::dto::{
    FarmListResponse, FarmResponse, NamePayload, PaginationMeta, PondListResponse, PondResponse,
    RequestMetricListResponse, RequestMetricResponse,
};
use crate::api::handlers::{farm, pond, system, telemetry};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI document for the REST API.
///
/// Every documented payload is wrapped in the `{data, error}` envelope.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "farm-gateway",
        description = "Farms, their ponds, and request telemetry. Responses use the `{data, error}` envelope."
    ),
    paths(
        system::ping,
        farm::list_farms,
        farm::get_farm,
        farm::create_farm,
        farm::update_farm,
        farm::delete_farm,
        pond::list_ponds,
        pond::get_pond,
        pond::create_pond,
        pond::update_pond,
        pond::delete_pond,
        telemetry::request_metrics,
    ),
    components(schemas(
        NamePayload,
        FarmResponse,
        FarmListResponse,
        PondResponse,
        PondListResponse,
        PaginationMeta,
        RequestMetricResponse,
        RequestMetricListResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Farms", description = "Farm management"),
        (name = "Ponds", description = "Ponds scoped to a farm"),
        (name = "Telemetry", description = "Per-endpoint request statistics"),
        (name = "System", description = "Liveness"),
    )
)]
pub struct ApiDoc;
