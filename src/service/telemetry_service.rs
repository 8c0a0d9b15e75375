//! Telemetry service: request-log ingestion and per-endpoint summary.

use std::sync::Arc;

use super::log_forwarded;
use crate::context::RequestContext;
use crate::domain::{RequestLog, RequestMetricSummary};
use crate::error::ApiError;
use crate::persistence::TelemetryStore;

/// Records request samples and reports their aggregates.
#[derive(Debug, Clone)]
pub struct TelemetryService {
    store: Arc<dyn TelemetryStore>,
}

impl TelemetryService {
    /// Creates a new `TelemetryService` over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Appends one request sample. No retry on failure.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn store_request_log(&self, ctx: &RequestContext, log: &RequestLog) -> Result<(), ApiError> {
        self.store
            .store(ctx, log)
            .await
            .inspect_err(|e| log_forwarded(ctx, "telemetry.store_request_log", e))
    }

    /// Per-endpoint statistics over every recorded sample.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if nothing has been recorded yet.
    pub async fn get_summary(&self, ctx: &RequestContext) -> Result<Vec<RequestMetricSummary>, ApiError> {
        self.store
            .summary(ctx)
            .await
            .and_then(|rows| {
                if rows.is_empty() {
                    Err(ApiError::NotFound)
                } else {
                    Ok(rows)
                }
            })
            .inspect_err(|e| log_forwarded(ctx, "telemetry.get_summary", e))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::persistence::MemoryStore;

    #[tokio::test]
    async fn summary_is_not_found_until_first_sample() {
        let svc = TelemetryService::new(Arc::new(MemoryStore::new()));
        let ctx = RequestContext::new("test");
        assert!(matches!(svc.get_summary(&ctx).await, Err(ApiError::NotFound)));

        let log = RequestLog {
            endpoint: "GET /api/v1/farms".to_string(),
            latency: 12.5,
            user_agent: "curl/8.0".to_string(),
            requested_at: Utc::now(),
        };
        assert!(svc.store_request_log(&ctx, &log).await.is_ok());

        let Ok(rows) = svc.get_summary(&ctx).await else {
            panic!("summary failed");
        };
        let [row] = rows.as_slice() else {
            panic!("expected one row, got {rows:?}");
        };
        assert_eq!(row.endpoint, "GET /api/v1/farms");
        assert_eq!(row.count, 1);
        assert_eq!(row.unique_user_agent, 1);
        assert!((row.min_latency - 12.5).abs() < f64::EPSILON);
        assert!((row.avg_latency - 12.5).abs() < f64::EPSILON);
        assert!((row.max_latency - 12.5).abs() < f64::EPSILON);
    }
}
