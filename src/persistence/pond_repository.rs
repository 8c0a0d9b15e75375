//! PostgreSQL implementation of [`PondStore`].
//!
//! Pond names are checked globally, not per farm: two farms cannot each
//! own a live pond called "Pond A". The partial unique index on
//! `ponds(name)` backs this up against concurrent writers.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{PondStore, to_bigint, to_count};
use crate::context::RequestContext;
use crate::domain::{Pond, PondQuery, PondWithFarm};
use crate::error::ApiError;

/// `ponds` table access (joined with `farms` for reads).
#[derive(Debug, Clone)]
pub struct PgPondStore {
    pool: PgPool,
}

impl PgPondStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PondFarmRow {
    id: i64,
    farm_id: i64,
    farm_name: String,
    name: String,
}

impl From<PondFarmRow> for PondWithFarm {
    fn from(row: PondFarmRow) -> Self {
        Self {
            id: row.id,
            farm_id: row.farm_id,
            farm_name: row.farm_name,
            name: row.name,
        }
    }
}

/// Parent check shared by store and upsert.
async fn ensure_farm_exists(
    tx: &mut Transaction<'_, Postgres>,
    farm_id: i64,
) -> Result<(), ApiError> {
    let farms = sqlx::query_scalar::<_, i64>(
        "SELECT count(*) FROM farms WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(farm_id)
    .fetch_one(&mut **tx)
    .await?;
    if farms == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

impl PgPondStore {
    async fn fetch_page(
        &self,
        ctx: &RequestContext,
        query: &PondQuery,
    ) -> Result<Vec<PondWithFarm>, ApiError> {
        let rows = sqlx::query_as::<_, PondFarmRow>(
            "SELECT p.id, f.id AS farm_id, f.name AS farm_name, p.name \
             FROM ponds p JOIN farms f ON p.farm_id = f.id \
             WHERE p.farm_id = $1 AND f.deleted_at IS NULL AND p.deleted_at IS NULL \
               AND ($2 = '' OR strpos(lower(p.name), lower($2)) > 0) \
             LIMIT $3 OFFSET $4",
        )
        .bind(query.farm_id)
        .bind(&query.keyword)
        .bind(to_bigint(query.pagination.limit))
        .bind(to_bigint(query.pagination.offset()))
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to fetch ponds"))?;

        Ok(rows.into_iter().map(PondWithFarm::from).collect())
    }

    async fn count_matching(&self, ctx: &RequestContext, query: &PondQuery) -> Result<u64, ApiError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM ponds p JOIN farms f ON p.farm_id = f.id \
             WHERE p.farm_id = $1 AND f.deleted_at IS NULL AND p.deleted_at IS NULL \
               AND ($2 = '' OR strpos(lower(p.name), lower($2)) > 0)",
        )
        .bind(query.farm_id)
        .bind(&query.keyword)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to count ponds"))?;

        Ok(to_count(count))
    }

    async fn fetch_one(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        id: i64,
    ) -> Result<Option<PondWithFarm>, ApiError> {
        let row = sqlx::query_as::<_, PondFarmRow>(
            "SELECT p.id, f.id AS farm_id, f.name AS farm_name, p.name \
             FROM ponds p JOIN farms f ON p.farm_id = f.id \
             WHERE p.id = $1 AND p.farm_id = $2 AND f.deleted_at IS NULL AND p.deleted_at IS NULL",
        )
        .bind(id)
        .bind(farm_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to fetch pond"))?;

        Ok(row.map(PondWithFarm::from))
    }

    async fn insert(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        ensure_farm_exists(&mut tx, pond.farm_id).await?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM ponds WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(&pond.name)
        .fetch_one(&mut *tx)
        .await?;
        if taken != 0 {
            return Err(ApiError::DuplicatedResource);
        }

        sqlx::query("INSERT INTO ponds (farm_id, name) VALUES ($1, $2)")
            .bind(pond.farm_id)
            .bind(&pond.name)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to save pond"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_or_rename(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        ensure_farm_exists(&mut tx, pond.farm_id).await?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM ponds WHERE id <> $1 AND name = $2 AND deleted_at IS NULL",
        )
        .bind(pond.id)
        .bind(&pond.name)
        .fetch_one(&mut *tx)
        .await?;
        if taken != 0 {
            return Err(ApiError::DuplicatedResource);
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM ponds WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(pond.id)
        .fetch_one(&mut *tx)
        .await?;

        let write = if existing == 0 {
            sqlx::query("INSERT INTO ponds (farm_id, name) VALUES ($1, $2)")
                .bind(pond.farm_id)
                .bind(&pond.name)
                .execute(&mut *tx)
                .await
        } else {
            sqlx::query("UPDATE ponds SET name = $1, updated_at = NOW() WHERE id = $2")
                .bind(&pond.name)
                .bind(pond.id)
                .execute(&mut *tx)
                .await
        };
        write.inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to upsert pond"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM ponds WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if existing == 0 {
            tracing::warn!(request_id = ctx.request_id(), pond_id = id, "pond doesn't exist");
            return Err(ApiError::NotFound);
        }

        sqlx::query("UPDATE ponds SET updated_at = NOW(), deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to delete pond"))?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl PondStore for PgPondStore {
    async fn get_all(
        &self,
        ctx: &RequestContext,
        query: &PondQuery,
    ) -> Result<Vec<PondWithFarm>, ApiError> {
        ctx.bounded(self.fetch_page(ctx, query)).await
    }

    async fn count(&self, ctx: &RequestContext, query: &PondQuery) -> Result<u64, ApiError> {
        ctx.bounded(self.count_matching(ctx, query)).await
    }

    async fn get_one(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        id: i64,
    ) -> Result<Option<PondWithFarm>, ApiError> {
        ctx.bounded(self.fetch_one(ctx, farm_id, id)).await
    }

    async fn store(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        ctx.bounded(self.insert(ctx, pond)).await
    }

    async fn upsert(&self, ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        ctx.bounded(self.insert_or_rename(ctx, pond)).await
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        ctx.bounded(self.soft_delete(ctx, id)).await
    }
}
