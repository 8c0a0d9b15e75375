//! REST endpoint handlers organized by resource.

pub mod farm;
pub mod pond;
pub mod system;
pub mod telemetry;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(system::routes())
        .merge(farm::routes())
        .merge(pond::routes())
        .merge(telemetry::routes())
}
