//! Request-metric and access-log middleware for the `/api/v1` routes.
//!
//! Runs after routing, so the matched route template (not the raw URI) is
//! what identifies an endpoint: `GET /api/v1/farms/{farm_id}` collects
//! every farm lookup regardless of id.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::app_state::AppState;
use crate::context::{REQUEST_ID_HEADER, RequestContext};
use crate::domain::RequestLog;

/// Attaches a [`RequestContext`] to the request, runs it, writes one
/// `info` access line, then records a [`RequestLog`] sample. A failed write
/// is logged and does not change the response.
pub async fn record_request_metric(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let endpoint = format!("{method} {route}");
    let remote_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let ctx = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(RequestContext::generate, RequestContext::new)
        .with_timeout(state.request_timeout);
    request.extensions_mut().insert(ctx.clone());

    let requested_at = Utc::now();
    let started = Instant::now();
    let response = next.run(request).await;

    let latency = started.elapsed().as_secs_f64() * 1000.0;

    tracing::info!(
        request_id = ctx.request_id(),
        method = %method,
        uri = %uri,
        route = %route,
        status = response.status().as_u16(),
        latency_ms = latency,
        user_agent = %user_agent,
        remote_ip = %remote_ip,
        "request completed"
    );

    let log = RequestLog {
        endpoint,
        latency,
        user_agent,
        requested_at,
    };
    // The handler's deadline may already be spent; the sample is still kept.
    if let Err(err) = state
        .telemetry_service
        .store_request_log(&ctx.detached(), &log)
        .await
    {
        tracing::warn!(
            request_id = ctx.request_id(),
            endpoint = %log.endpoint,
            error = %err,
            "request metric dropped"
        );
    }

    response
}
