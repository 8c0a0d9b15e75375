//! System endpoints: liveness.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::Envelope;

/// Fixed liveness payload.
pub const PING_REPLY: &str = "hello world";

/// `GET /misc/ping` — Liveness check.
#[utoipa::path(
    get,
    path = "/api/v1/misc/ping",
    tag = "System",
    summary = "Ping",
    description = "Returns a fixed string while the process is serving requests.",
    responses(
        (status = 200, description = "Service is alive (`data` is \"hello world\")", body = String),
    )
)]
pub async fn ping() -> impl IntoResponse {
    Json(Envelope::data(PING_REPLY))
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/misc/ping", get(ping))
}
