//! Pond CRUD handlers, scoped under a farm.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ListParams, NamePayload, PaginationMeta, PondListResponse, PondResponse};
use crate::app_state::AppState;
use crate::context::RequestContext;
use crate::error::{ApiError, Envelope, ErrorResponse};

/// `GET /farms/{farm_id}/ponds` — List the ponds of a farm.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when nothing matches or the farm is gone.
#[utoipa::path(
    get,
    path = "/api/v1/farms/{farm_id}/ponds",
    tag = "Ponds",
    summary = "List ponds",
    description = "Returns one page of non-deleted ponds of a non-deleted farm. Pagination is normalized like the farm list.",
    params(("farm_id" = i64, Path, description = "Farm identifier"), ListParams),
    responses(
        (status = 200, description = "Pond page (inside `data`)", body = PondListResponse),
        (status = 400, description = "Malformed path or query", body = ErrorResponse),
        (status = 404, description = "No pond matches", body = ErrorResponse),
    )
)]
pub async fn list_ponds(
    State(state): State<AppState>,
    ctx: RequestContext,
    farm_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(farm_id) = farm_id?;
    let Query(params) = params?;
    let page = state
        .pond_service
        .get_all(&ctx, farm_id, &params.keyword(), params.limit, params.page)
        .await?;

    Ok(Json(Envelope::data(PondListResponse {
        ponds: page.items.into_iter().map(PondResponse::from).collect(),
        meta: PaginationMeta {
            limit: page.pagination.limit,
            page: page.pagination.page,
            total_page: page.total_page,
        },
    })))
}

/// `GET /farms/{farm_id}/ponds/{pond_id}` — Get one pond.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the pond or its farm is absent.
#[utoipa::path(
    get,
    path = "/api/v1/farms/{farm_id}/ponds/{pond_id}",
    tag = "Ponds",
    summary = "Get pond",
    params(
        ("farm_id" = i64, Path, description = "Farm identifier"),
        ("pond_id" = i64, Path, description = "Pond identifier"),
    ),
    responses(
        (status = 200, description = "Pond (inside `data`)", body = PondResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Pond not found", body = ErrorResponse),
    )
)]
pub async fn get_pond(
    State(state): State<AppState>,
    ctx: RequestContext,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((farm_id, pond_id)) = ids?;
    let pond = state.pond_service.get_one(&ctx, farm_id, pond_id).await?;
    Ok(Json(Envelope::data(PondResponse::from(pond))))
}

/// `POST /farms/{farm_id}/ponds` — Create a pond.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the farm is absent and
/// [`ApiError::DuplicatedResource`] if the name is taken.
#[utoipa::path(
    post,
    path = "/api/v1/farms/{farm_id}/ponds",
    tag = "Ponds",
    summary = "Create pond",
    description = "Pond names are unique across all farms.",
    params(("farm_id" = i64, Path, description = "Farm identifier")),
    request_body = NamePayload,
    responses(
        (status = 201, description = "Pond created, `data` is null"),
        (status = 400, description = "Name missing or malformed id", body = ErrorResponse),
        (status = 404, description = "Farm not found", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
        (status = 422, description = "Unreadable body", body = ErrorResponse),
    )
)]
pub async fn create_pond(
    State(state): State<AppState>,
    ctx: RequestContext,
    farm_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(farm_id) = farm_id?;
    let Json(payload) = payload?;
    state.pond_service.create(&ctx, farm_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(Envelope::empty())))
}

/// `PUT /farms/{farm_id}/ponds/{pond_id}` — Rename a pond, creating it when
/// the id is unknown.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the farm is absent and
/// [`ApiError::DuplicatedResource`] if another pond holds the name.
#[utoipa::path(
    put,
    path = "/api/v1/farms/{farm_id}/ponds/{pond_id}",
    tag = "Ponds",
    summary = "Update pond",
    params(
        ("farm_id" = i64, Path, description = "Farm identifier"),
        ("pond_id" = i64, Path, description = "Pond identifier"),
    ),
    request_body = NamePayload,
    responses(
        (status = 200, description = "Pond updated, `data` is null"),
        (status = 400, description = "Name missing or malformed id", body = ErrorResponse),
        (status = 404, description = "Farm not found", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
        (status = 422, description = "Unreadable body", body = ErrorResponse),
    )
)]
pub async fn update_pond(
    State(state): State<AppState>,
    ctx: RequestContext,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((farm_id, pond_id)) = ids?;
    let Json(payload) = payload?;
    state
        .pond_service
        .update(&ctx, farm_id, pond_id, &payload.name)
        .await?;
    Ok(Json(Envelope::empty()))
}

/// `DELETE /farms/{farm_id}/ponds/{pond_id}` — Soft-delete a pond.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the pond is absent or already deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/farms/{farm_id}/ponds/{pond_id}",
    tag = "Ponds",
    summary = "Delete pond",
    params(
        ("farm_id" = i64, Path, description = "Farm identifier"),
        ("pond_id" = i64, Path, description = "Pond identifier"),
    ),
    responses(
        (status = 200, description = "Pond deleted, `data` is null"),
        (status = 404, description = "Pond not found", body = ErrorResponse),
    )
)]
pub async fn delete_pond(
    State(state): State<AppState>,
    ctx: RequestContext,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((_farm_id, pond_id)) = ids?;
    state.pond_service.delete(&ctx, pond_id).await?;
    Ok(Json(Envelope::empty()))
}

/// Pond routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/farms/{farm_id}/ponds", get(list_ponds).post(create_pond))
        .route(
            "/farms/{farm_id}/ponds/{pond_id}",
            get(get_pond).put(update_pond).delete(delete_pond),
        )
}
