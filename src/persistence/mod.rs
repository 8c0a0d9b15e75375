//! Persistence layer: store traits and their backends.
//!
//! Each entity kind has one trait (`FarmStore`, `PondStore`,
//! `TelemetryStore`). The PostgreSQL implementations run every
//! check-then-write sequence inside one transaction; [`MemoryStore`]
//! implements all three traits with the same semantics for tests and for
//! running without a database.
//!
//! Not-found on single reads is `Ok(None)`; the service layer decides
//! whether that becomes [`ApiError::NotFound`].

pub mod farm_repository;
pub mod memory;
pub mod pond_repository;
pub mod telemetry_repository;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::GatewayConfig;
use crate::context::RequestContext;
use crate::domain::{Farm, FarmQuery, Pond, PondQuery, PondWithFarm, RequestLog, RequestMetricSummary};
use crate::error::ApiError;

pub use farm_repository::PgFarmStore;
pub use memory::MemoryStore;
pub use pond_repository::PgPondStore;
pub use telemetry_repository::PgTelemetryStore;

/// Farm persistence operations.
#[async_trait]
pub trait FarmStore: Send + Sync + fmt::Debug {
    /// Non-deleted farms matching `query`, one page, natural storage order.
    async fn get_all(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<Vec<Farm>, ApiError>;

    /// Number of non-deleted farms matching `query`, ignoring pagination.
    async fn count(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<u64, ApiError>;

    /// The non-deleted farm with this id, if any.
    async fn get_one(&self, ctx: &RequestContext, id: i64) -> Result<Option<Farm>, ApiError>;

    /// Inserts a farm named `name`.
    ///
    /// Fails with [`ApiError::DuplicatedResource`] if a non-deleted farm
    /// already has the name.
    async fn store(&self, ctx: &RequestContext, name: &str) -> Result<(), ApiError>;

    /// Renames the non-deleted farm `farm.id`, or inserts a new farm with a
    /// fresh id when no such row exists.
    ///
    /// Fails with [`ApiError::DuplicatedResource`] if a different
    /// non-deleted farm holds the name.
    /// The SQL stores refresh `updated_at` on rename.
    async fn upsert(&self, ctx: &RequestContext, farm: &Farm) -> Result<(), ApiError>;

    /// Soft-deletes the farm. [`ApiError::NotFound`] if it is absent or
    /// already deleted.
    ///
    /// The SQL stores stamp `updated_at` and `deleted_at` with the same
    /// instant. [`MemoryStore`] records only the deletion time; it keeps no
    /// update timestamps.
    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError>;
}

/// Pond persistence operations. Every read is joined with the parent farm
/// and requires it to be non-deleted.
#[async_trait]
pub trait PondStore: Send + Sync + fmt::Debug {
    /// Non-deleted ponds of `query.farm_id`, one page.
    async fn get_all(
        &self,
        ctx: &RequestContext,
        query: &PondQuery,
    ) -> Result<Vec<PondWithFarm>, ApiError>;

    /// Number of ponds `get_all` would return without pagination.
    async fn count(&self, ctx: &RequestContext, query: &PondQuery) -> Result<u64, ApiError>;

    /// The non-deleted pond `id` belonging to `farm_id`, if any.
    async fn get_one(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        id: i64,
    ) -> Result<Option<PondWithFarm>, ApiError>;

    /// Inserts a pond under `pond.farm_id`.
    ///
    /// [`ApiError::NotFound`] if the farm is absent or deleted;
    /// [`ApiError::DuplicatedResource`] if any non-deleted pond has the name.
    async fn store(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError>;

    /// Renames pond `pond.id`, or inserts a new pond when no such row exists.
    /// Same parent and name checks as [`PondStore::store`], excluding the
    /// pond itself from the name check. The SQL stores refresh `updated_at` on
    /// rename.
    async fn upsert(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError>;

    /// Soft-deletes the pond. [`ApiError::NotFound`] if it is absent or
    /// already deleted.
    ///
    /// The SQL stores stamp `updated_at` and `deleted_at` with the same
    /// instant. [`MemoryStore`] records only the deletion time; it keeps no
    /// update timestamps.
    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError>;
}

/// Append-only request telemetry.
#[async_trait]
pub trait TelemetryStore: Send + Sync + fmt::Debug {
    /// Appends one sample.
    async fn store(&self, ctx: &RequestContext, log: &RequestLog) -> Result<(), ApiError>;

    /// Per-endpoint aggregates over every sample, ordered by endpoint.
    async fn summary(&self, ctx: &RequestContext) -> Result<Vec<RequestMetricSummary>, ApiError>;
}

/// Opens the PostgreSQL pool and, if configured, applies migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect(config: &GatewayConfig) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    if config.database_run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    Ok(pool)
}

/// Converts a row count reported by PostgreSQL (`BIGINT`) to `u64`.
pub(crate) fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Converts a pagination bound to the `BIGINT` PostgreSQL expects.
pub(crate) fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Case-insensitive literal substring match used by the in-memory store;
/// mirrors the `strpos(lower(name), lower(keyword)) > 0` filter of the SQL
/// stores. `%` and `_` have no special meaning.
pub(crate) fn keyword_matches(name: &str, keyword: &str) -> bool {
    keyword.is_empty() || name.to_lowercase().contains(&keyword.to_lowercase())
}
