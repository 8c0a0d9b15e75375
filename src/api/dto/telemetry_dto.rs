//! Request telemetry DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::RequestMetricSummary;

/// Aggregated statistics for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RequestMetricResponse {
    /// `"<METHOD> <route>"`.
    #[schema(example = "GET /api/v1/farms")]
    pub endpoint: String,
    /// Smallest latency in ms.
    pub min_latency: f64,
    /// Mean latency in ms.
    pub avg_latency: f64,
    /// Largest latency in ms.
    pub max_latency: f64,
    /// Number of distinct user agents.
    pub unique_user_agent: i64,
    /// Number of requests.
    pub count: i64,
}

impl From<RequestMetricSummary> for RequestMetricResponse {
    fn from(s: RequestMetricSummary) -> Self {
        Self {
            endpoint: s.endpoint,
            min_latency: s.min_latency,
            avg_latency: s.avg_latency,
            max_latency: s.max_latency,
            unique_user_agent: s.unique_user_agent,
            count: s.count,
        }
    }
}

/// Response for `GET /telemetry/request-metrics`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestMetricListResponse {
    /// One entry per endpoint, ordered by endpoint.
    pub request_metrics: Vec<RequestMetricResponse>,
}
