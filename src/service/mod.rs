//! Service layer: business logic orchestration.
//!
//! Services sit between the handlers and the stores. They normalize
//! pagination, validate names, turn missing rows into
//! [`ApiError::NotFound`] and log every error they forward together with
//! the request id.

pub mod farm_service;
pub mod pond_service;
pub mod telemetry_service;

pub use farm_service::FarmService;
pub use pond_service::PondService;
pub use telemetry_service::TelemetryService;

use crate::context::RequestContext;
use crate::domain::Pagination;
use crate::error::ApiError;

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Normalized pagination the rows were fetched with.
    pub pagination: Pagination,
    /// `count / limit`, truncating.
    pub total_page: u64,
}

/// Trims `name`, rejecting blank input.
fn required_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::MissingRequiredAttribute("name"));
    }
    Ok(name.to_string())
}

/// Logs a forwarded error. Client errors are expected traffic and go to
/// `warn`; everything else is `error`.
fn log_forwarded(ctx: &RequestContext, operation: &'static str, err: &ApiError) {
    if err.status_code().is_server_error() {
        tracing::error!(request_id = ctx.request_id(), operation, error = %err, "operation failed");
    } else {
        tracing::warn!(request_id = ctx.request_id(), operation, error = %err, "operation rejected");
    }
}
