//! Request telemetry read endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RequestMetricListResponse, RequestMetricResponse};
use crate::app_state::AppState;
use crate::context::RequestContext;
use crate::error::{ApiError, Envelope, ErrorResponse};

/// `GET /telemetry/request-metrics` — Per-endpoint latency statistics.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] before the first request is recorded.
#[utoipa::path(
    get,
    path = "/api/v1/telemetry/request-metrics",
    tag = "Telemetry",
    summary = "Request metrics",
    description = "Aggregates every recorded request by endpoint: latency min/avg/max in milliseconds (2 decimals), request count and distinct user agents.",
    responses(
        (status = 200, description = "Metrics (inside `data`)", body = RequestMetricListResponse),
        (status = 404, description = "Nothing recorded yet", body = ErrorResponse),
    )
)]
pub async fn request_metrics(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.telemetry_service.get_summary(&ctx).await?;
    Ok(Json(Envelope::data(RequestMetricListResponse {
        request_metrics: rows.into_iter().map(RequestMetricResponse::from).collect(),
    })))
}

/// Telemetry routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/telemetry/request-metrics", get(request_metrics))
}
