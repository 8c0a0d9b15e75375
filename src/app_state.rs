//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::persistence::{FarmStore, PondStore, TelemetryStore};
use crate::service::{FarmService, PondService, TelemetryService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Farm business logic.
    pub farm_service: Arc<FarmService>,
    /// Pond business logic.
    pub pond_service: Arc<PondService>,
    /// Request telemetry.
    pub telemetry_service: Arc<TelemetryService>,
    /// Deadline given to each `/api/v1` request's [`crate::context::RequestContext`].
    pub request_timeout: Duration,
    /// Service name recorded on every request span.
    pub service_name: String,
}

impl AppState {
    /// Wires the services over the given stores.
    #[must_use]
    pub fn new(
        farms: Arc<dyn FarmStore>,
        ponds: Arc<dyn PondStore>,
        telemetry: Arc<dyn TelemetryStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            farm_service: Arc::new(FarmService::new(farms)),
            pond_service: Arc::new(PondService::new(ponds)),
            telemetry_service: Arc::new(TelemetryService::new(telemetry)),
            request_timeout,
            service_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    /// Overrides the service name reported in request spans.
    #[must_use]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}
