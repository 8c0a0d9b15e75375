//! PostgreSQL implementation of [`TelemetryStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::TelemetryStore;
use crate::context::RequestContext;
use crate::domain::{RequestLog, RequestMetricSummary};
use crate::error::ApiError;

/// `request_logs` table access.
#[derive(Debug, Clone)]
pub struct PgTelemetryStore {
    pool: PgPool,
}

impl PgTelemetryStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn append(&self, ctx: &RequestContext, log: &RequestLog) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO request_logs (endpoint, latency, user_agent, requested_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&log.endpoint)
        .bind(log.latency)
        .bind(&log.user_agent)
        .bind(log.requested_at)
        .execute(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to save request log"))?;

        Ok(())
    }

    async fn aggregate(&self, ctx: &RequestContext) -> Result<Vec<RequestMetricSummary>, ApiError> {
        // round() is only defined for numeric with a scale argument.
        let rows = sqlx::query_as::<_, (String, f64, f64, f64, i64, i64)>(
            "SELECT endpoint, \
                    round(min(latency)::numeric, 2)::float8, \
                    round(avg(latency)::numeric, 2)::float8, \
                    round(max(latency)::numeric, 2)::float8, \
                    count(*), \
                    count(DISTINCT user_agent) \
             FROM request_logs GROUP BY endpoint ORDER BY endpoint",
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to aggregate request logs"))?;

        Ok(rows
            .into_iter()
            .map(
                |(endpoint, min_latency, avg_latency, max_latency, count, unique_user_agent)| {
                    RequestMetricSummary {
                        endpoint,
                        min_latency,
                        avg_latency,
                        max_latency,
                        count,
                        unique_user_agent,
                    }
                },
            )
            .collect())
    }
}

#[async_trait]
impl TelemetryStore for PgTelemetryStore {
    async fn store(&self, ctx: &RequestContext, log: &RequestLog) -> Result<(), ApiError> {
        ctx.bounded(self.append(ctx, log)).await
    }

    async fn summary(&self, ctx: &RequestContext) -> Result<Vec<RequestMetricSummary>, ApiError> {
        ctx.bounded(self.aggregate(ctx)).await
    }
}

#[cfg(all(test, feature = "pg-tests"))]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[sqlx::test(migrations = "./migrations")]
    async fn summary_groups_by_endpoint(pool: PgPool) {
        let store = PgTelemetryStore::new(pool);
        let ctx = RequestContext::new("pg-test");
        for (latency, agent) in [(1.0, "curl"), (2.0, "curl"), (4.5, "firefox")] {
            let log = RequestLog {
                endpoint: "GET /api/v1/farms".to_string(),
                latency,
                user_agent: agent.to_string(),
                requested_at: Utc::now(),
            };
            assert!(store.store(&ctx, &log).await.is_ok());
        }

        let Ok(rows) = store.summary(&ctx).await else {
            panic!("summary failed");
        };
        let [row] = rows.as_slice() else {
            panic!("expected one row, got {rows:?}");
        };
        assert_eq!(row.count, 3);
        assert_eq!(row.unique_user_agent, 2);
        assert!((row.min_latency - 1.0).abs() < 1e-9);
        assert!((row.avg_latency - 2.5).abs() < 1e-9);
        assert!((row.max_latency - 4.5).abs() < 1e-9);
    }
}
