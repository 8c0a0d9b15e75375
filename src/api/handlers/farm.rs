//! Farm CRUD handlers: list, get, create, update, delete.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{FarmListResponse, FarmResponse, ListParams, NamePayload, PaginationMeta};
use crate::app_state::AppState;
use crate::context::RequestContext;
use crate::error::{ApiError, Envelope, ErrorResponse};

/// `GET /farms` — List farms with pagination and an optional keyword.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when no farm matches.
#[utoipa::path(
    get,
    path = "/api/v1/farms",
    tag = "Farms",
    summary = "List farms",
    description = "Returns one page of non-deleted farms. `limit` outside 1-99 becomes 100 and `page` below 1 becomes 1. An empty result is reported as 404.",
    params(ListParams),
    responses(
        (status = 200, description = "Farm page (inside `data`)", body = FarmListResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse),
        (status = 404, description = "No farm matches", body = ErrorResponse),
    )
)]
pub async fn list_farms(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let page = state
        .farm_service
        .get_all(&ctx, &params.keyword(), params.limit, params.page)
        .await?;

    Ok(Json(Envelope::data(FarmListResponse {
        farms: page.items.into_iter().map(FarmResponse::from).collect(),
        meta: PaginationMeta {
            limit: page.pagination.limit,
            page: page.pagination.page,
            total_page: page.total_page,
        },
    })))
}

/// `GET /farms/{farm_id}` — Get one farm.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the farm is absent or deleted.
#[utoipa::path(
    get,
    path = "/api/v1/farms/{farm_id}",
    tag = "Farms",
    summary = "Get farm",
    params(("farm_id" = i64, Path, description = "Farm identifier")),
    responses(
        (status = 200, description = "Farm (inside `data`)", body = FarmResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Farm not found", body = ErrorResponse),
    )
)]
pub async fn get_farm(
    State(state): State<AppState>,
    ctx: RequestContext,
    farm_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(farm_id) = farm_id?;
    let farm = state.farm_service.get_one(&ctx, farm_id).await?;
    Ok(Json(Envelope::data(FarmResponse::from(farm))))
}

/// `POST /farms` — Create a farm.
///
/// # Errors
///
/// Returns [`ApiError::DuplicatedResource`] if the name is taken.
#[utoipa::path(
    post,
    path = "/api/v1/farms",
    tag = "Farms",
    summary = "Create farm",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Farm created, `data` is null"),
        (status = 400, description = "Name missing", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
        (status = 422, description = "Unreadable body", body = ErrorResponse),
    )
)]
pub async fn create_farm(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    state.farm_service.create(&ctx, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(Envelope::empty())))
}

/// `PUT /farms/{farm_id}` — Rename a farm, creating it when the id is unknown.
///
/// # Errors
///
/// Returns [`ApiError::DuplicatedResource`] if another farm holds the name.
#[utoipa::path(
    put,
    path = "/api/v1/farms/{farm_id}",
    tag = "Farms",
    summary = "Update farm",
    description = "Renames the farm. An unknown id creates a new farm with a server-assigned id.",
    params(("farm_id" = i64, Path, description = "Farm identifier")),
    request_body = NamePayload,
    responses(
        (status = 200, description = "Farm updated, `data` is null"),
        (status = 400, description = "Name missing or malformed id", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
        (status = 422, description = "Unreadable body", body = ErrorResponse),
    )
)]
pub async fn update_farm(
    State(state): State<AppState>,
    ctx: RequestContext,
    farm_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(farm_id) = farm_id?;
    let Json(payload) = payload?;
    state.farm_service.update(&ctx, farm_id, &payload.name).await?;
    Ok(Json(Envelope::empty()))
}

/// `DELETE /farms/{farm_id}` — Soft-delete a farm.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the farm is absent or already deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/farms/{farm_id}",
    tag = "Farms",
    summary = "Delete farm",
    params(("farm_id" = i64, Path, description = "Farm identifier")),
    responses(
        (status = 200, description = "Farm deleted, `data` is null"),
        (status = 404, description = "Farm not found", body = ErrorResponse),
    )
)]
pub async fn delete_farm(
    State(state): State<AppState>,
    ctx: RequestContext,
    farm_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(farm_id) = farm_id?;
    state.farm_service.delete(&ctx, farm_id).await?;
    Ok(Json(Envelope::empty()))
}

/// Farm routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/farms", get(list_farms).post(create_farm))
        .route(
            "/farms/{farm_id}",
            get(get_farm).put(update_farm).delete(delete_farm),
        )
}
