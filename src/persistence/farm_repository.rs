//! PostgreSQL implementation of [`FarmStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::{FarmStore, to_bigint, to_count};
use crate::context::RequestContext;
use crate::domain::{Farm, FarmQuery};
use crate::error::ApiError;

/// `farms` table access using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgFarmStore {
    pool: PgPool,
}

impl PgFarmStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FarmRow {
    id: i64,
    name: String,
}

impl From<FarmRow> for Farm {
    fn from(row: FarmRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl PgFarmStore {
    async fn fetch_page(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<Vec<Farm>, ApiError> {
        let rows = sqlx::query_as::<_, FarmRow>(
            "SELECT id, name FROM farms \
             WHERE deleted_at IS NULL AND ($1 = '' OR strpos(lower(name), lower($1)) > 0) \
             LIMIT $2 OFFSET $3",
        )
        .bind(&query.keyword)
        .bind(to_bigint(query.pagination.limit))
        .bind(to_bigint(query.pagination.offset()))
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to fetch farms"))?;

        Ok(rows.into_iter().map(Farm::from).collect())
    }

    async fn count_matching(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<u64, ApiError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM farms \
             WHERE deleted_at IS NULL AND ($1 = '' OR strpos(lower(name), lower($1)) > 0)",
        )
        .bind(&query.keyword)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to count farms"))?;

        Ok(to_count(count))
    }

    async fn fetch_one(&self, ctx: &RequestContext, id: i64) -> Result<Option<Farm>, ApiError> {
        let row = sqlx::query_as::<_, FarmRow>(
            "SELECT id, name FROM farms WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to fetch farm"))?;

        Ok(row.map(Farm::from))
    }

    async fn insert(&self, ctx: &RequestContext, name: &str) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM farms WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        if taken != 0 {
            return Err(ApiError::DuplicatedResource);
        }

        sqlx::query("INSERT INTO farms (name) VALUES ($1)")
            .bind(name)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to save farm"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_or_rename(&self, ctx: &RequestContext, farm: &Farm) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM farms WHERE id <> $1 AND name = $2 AND deleted_at IS NULL",
        )
        .bind(farm.id)
        .bind(&farm.name)
        .fetch_one(&mut *tx)
        .await?;
        if taken != 0 {
            return Err(ApiError::DuplicatedResource);
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM farms WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(farm.id)
        .fetch_one(&mut *tx)
        .await?;

        let write = if existing == 0 {
            sqlx::query("INSERT INTO farms (name) VALUES ($1)")
                .bind(&farm.name)
                .execute(&mut *tx)
                .await
        } else {
            sqlx::query("UPDATE farms SET name = $1, updated_at = NOW() WHERE id = $2")
                .bind(&farm.name)
                .bind(farm.id)
                .execute(&mut *tx)
                .await
        };
        write.inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to upsert farm"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM farms WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if existing == 0 {
            return Err(ApiError::NotFound);
        }

        sqlx::query("UPDATE farms SET updated_at = NOW(), deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!(request_id = ctx.request_id(), error = %e, "failed to delete farm"))?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FarmStore for PgFarmStore {
    async fn get_all(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<Vec<Farm>, ApiError> {
        ctx.bounded(self.fetch_page(ctx, query)).await
    }

    async fn count(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<u64, ApiError> {
        ctx.bounded(self.count_matching(ctx, query)).await
    }

    async fn get_one(&self, ctx: &RequestContext, id: i64) -> Result<Option<Farm>, ApiError> {
        ctx.bounded(self.fetch_one(ctx, id)).await
    }

    async fn store(&self, ctx: &RequestContext, name: &str) -> Result<(), ApiError> {
        ctx.bounded(self.insert(ctx, name)).await
    }

    async fn upsert(&self, ctx: &RequestContext, farm: &Farm) -> Result<(), ApiError> {
        ctx.bounded(self.insert_or_rename(ctx, farm)).await
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        ctx.bounded(self.soft_delete(ctx, id)).await
    }
}

#[cfg(all(test, feature = "pg-tests"))]
#[allow(clippy::panic)]
mod tests {
    use tokio::task::JoinSet;

    use super::*;

    async fn all_farms(store: &PgFarmStore, ctx: &RequestContext) -> Vec<Farm> {
        let Ok(farms) = store.get_all(ctx, &FarmQuery::default()).await else {
            panic!("get_all failed");
        };
        farms
    }

    async fn count_keyword(store: &PgFarmStore, ctx: &RequestContext, keyword: &str) -> u64 {
        let query = FarmQuery {
            keyword: keyword.to_string(),
            ..FarmQuery::default()
        };
        let Ok(count) = store.count(ctx, &query).await else {
            panic!("count failed for {keyword:?}");
        };
        count
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_name_is_rejected(pool: PgPool) {
        let store = PgFarmStore::new(pool);
        let ctx = RequestContext::new("pg-test");
        assert!(store.store(&ctx, "Farm A").await.is_ok());
        let second = store.store(&ctx, "Farm A").await;
        assert!(matches!(second, Err(ApiError::DuplicatedResource)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unique_index_violation_is_duplicate(pool: PgPool) {
        let insert = "INSERT INTO farms (name) VALUES ('Farm A')";
        assert!(sqlx::query(insert).execute(&pool).await.is_ok());
        let Err(err) = sqlx::query(insert).execute(&pool).await else {
            panic!("second live row with the same name was accepted");
        };
        assert!(matches!(ApiError::from(err), ApiError::DuplicatedResource));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_creates_leave_one_row(pool: PgPool) {
        let store = PgFarmStore::new(pool);
        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.spawn(async move {
                let ctx = RequestContext::new(format!("pg-test-{i}"));
                store.store(&ctx, "Farm A").await
            });
        }

        let mut created = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => created += 1,
                Ok(Err(ApiError::DuplicatedResource)) => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(all_farms(&store, &RequestContext::new("pg-test")).await.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn keyword_wildcards_are_literal(pool: PgPool) {
        let store = PgFarmStore::new(pool);
        let ctx = RequestContext::new("pg-test");
        for name in ["Farm A", "Farm B", "100% organic"] {
            assert!(store.store(&ctx, name).await.is_ok());
        }

        assert_eq!(count_keyword(&store, &ctx, "_").await, 0);
        assert_eq!(count_keyword(&store, &ctx, "%").await, 1);
        assert_eq!(count_keyword(&store, &ctx, "m_A").await, 0);
        assert_eq!(count_keyword(&store, &ctx, "FARM").await, 2);
        assert_eq!(count_keyword(&store, &ctx, "").await, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn soft_deleted_farm_is_hidden_and_name_reusable(pool: PgPool) {
        let store = PgFarmStore::new(pool);
        let ctx = RequestContext::new("pg-test");
        assert!(store.store(&ctx, "Farm A").await.is_ok());
        let farms = all_farms(&store, &ctx).await;
        let [farm] = farms.as_slice() else {
            panic!("expected one farm, got {farms:?}");
        };

        assert!(store.delete(&ctx, farm.id).await.is_ok());
        assert!(matches!(store.get_one(&ctx, farm.id).await, Ok(None)));
        assert!(matches!(store.count(&ctx, &FarmQuery::default()).await, Ok(0)));
        assert!(matches!(store.delete(&ctx, farm.id).await, Err(ApiError::NotFound)));
        assert!(store.store(&ctx, "Farm A").await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_stamps_updated_and_deleted_at_together(pool: PgPool) {
        let store = PgFarmStore::new(pool.clone());
        let ctx = RequestContext::new("pg-test");
        assert!(store.store(&ctx, "Farm A").await.is_ok());
        let farms = all_farms(&store, &ctx).await;
        let [farm] = farms.as_slice() else {
            panic!("expected one farm, got {farms:?}");
        };
        assert!(store.delete(&ctx, farm.id).await.is_ok());

        let stamped = sqlx::query_scalar::<_, bool>(
            "SELECT deleted_at IS NOT NULL AND updated_at = deleted_at FROM farms WHERE id = $1",
        )
        .bind(farm.id)
        .fetch_one(&pool)
        .await;
        assert!(matches!(stamped, Ok(true)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn upsert_with_unknown_id_inserts_fresh_row(pool: PgPool) {
        let store = PgFarmStore::new(pool);
        let ctx = RequestContext::new("pg-test");
        let farm = Farm {
            id: 42,
            name: "New".to_string(),
        };
        assert!(store.upsert(&ctx, &farm).await.is_ok());
        let farms = all_farms(&store, &ctx).await;
        let [created] = farms.as_slice() else {
            panic!("expected one farm, got {farms:?}");
        };
        assert_ne!(created.id, 42);
        assert_eq!(created.name, "New");
    }
}
