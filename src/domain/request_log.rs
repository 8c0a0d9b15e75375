//! Request telemetry: raw samples and per-endpoint aggregates.

use chrono::{DateTime, Utc};

/// One append-only latency sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    /// `"<METHOD> <route>"`, e.g. `"GET /api/v1/farms"`.
    pub endpoint: String,
    /// Handler latency in milliseconds.
    pub latency: f64,
    /// Client `User-Agent` header (empty when absent).
    pub user_agent: String,
    /// When the request was received.
    pub requested_at: DateTime<Utc>,
}

/// Aggregate statistics for one endpoint.
///
/// Latencies are rounded to two decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMetricSummary {
    /// Endpoint the samples belong to.
    pub endpoint: String,
    /// Smallest latency.
    pub min_latency: f64,
    /// Mean latency.
    pub avg_latency: f64,
    /// Largest latency.
    pub max_latency: f64,
    /// Number of samples.
    pub count: i64,
    /// Number of distinct user agents.
    pub unique_user_agent: i64,
}

/// Rounds to two decimal places, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_two_decimals() {
        assert!((round2(1.234_9) - 1.23).abs() < f64::EPSILON);
        assert!((round2(1.236) - 1.24).abs() < 1e-9);
        assert!((round2(10.0) - 10.0).abs() < f64::EPSILON);
    }
}
