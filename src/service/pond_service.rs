//! Pond service: farm-scoped list shaping and pond mutations.

use std::sync::Arc;

use super::{ListPage, log_forwarded, required_name};
use crate::context::RequestContext;
use crate::domain::{Pagination, Pond, PondQuery, PondWithFarm};
use crate::error::ApiError;
use crate::persistence::PondStore;

/// Orchestration layer for pond operations.
#[derive(Debug, Clone)]
pub struct PondService {
    store: Arc<dyn PondStore>,
}

impl PondService {
    /// Creates a new `PondService` over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn PondStore>) -> Self {
        Self { store }
    }

    /// Lists non-deleted ponds of a non-deleted farm.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when nothing matches (including when
    /// the farm itself is absent or deleted), or the store's error.
    pub async fn get_all(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        keyword: &str,
        limit: i64,
        page: i64,
    ) -> Result<ListPage<PondWithFarm>, ApiError> {
        let query = PondQuery {
            farm_id,
            keyword: keyword.trim().to_string(),
            pagination: Pagination::normalize(limit, page),
        };
        self.list(ctx, &query)
            .await
            .inspect_err(|e| log_forwarded(ctx, "pond.get_all", e))
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        query: &PondQuery,
    ) -> Result<ListPage<PondWithFarm>, ApiError> {
        let count = self.store.count(ctx, query).await?;
        if count == 0 {
            return Err(ApiError::NotFound);
        }
        let items = self.store.get_all(ctx, query).await?;
        Ok(ListPage {
            items,
            pagination: query.pagination,
            total_page: query.pagination.total_page(count),
        })
    }

    /// Fetches pond `id` under farm `farm_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if either is absent or deleted, or
    /// if the pond belongs to another farm.
    pub async fn get_one(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        id: i64,
    ) -> Result<PondWithFarm, ApiError> {
        self.store
            .get_one(ctx, farm_id, id)
            .await
            .and_then(|pond| pond.ok_or(ApiError::NotFound))
            .inspect_err(|e| log_forwarded(ctx, "pond.get_one", e))
    }

    /// Creates a pond under `farm_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingRequiredAttribute`] for a blank name,
    /// [`ApiError::NotFound`] if the farm is absent or deleted, and
    /// [`ApiError::DuplicatedResource`] if the name is taken.
    pub async fn create(&self, ctx: &RequestContext, farm_id: i64, name: &str) -> Result<(), ApiError> {
        let result = match required_name(name) {
            Ok(name) => {
                let pond = Pond { id: 0, farm_id, name };
                self.store.store(ctx, &pond).await
            }
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log_forwarded(ctx, "pond.create", e))
    }

    /// Renames pond `id`, creating a new pond under `farm_id` if `id` does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Same as [`PondService::create`], except that the pond's own name
    /// does not count as a duplicate.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        farm_id: i64,
        id: i64,
        name: &str,
    ) -> Result<(), ApiError> {
        let result = match required_name(name) {
            Ok(name) => self.store.upsert(ctx, &Pond { id, farm_id, name }).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log_forwarded(ctx, "pond.update", e))
    }

    /// Soft-deletes pond `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the pond is absent or already
    /// deleted.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        self.store
            .delete(ctx, id)
            .await
            .inspect_err(|e| log_forwarded(ctx, "pond.delete", e))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::{FarmStore, MemoryStore};

    fn ctx() -> RequestContext {
        RequestContext::new("test")
    }

    async fn service_with_farm() -> PondService {
        let store = Arc::new(MemoryStore::new());
        assert!(FarmStore::store(store.as_ref(), &ctx(), "Farm A").await.is_ok());
        PondService::new(store)
    }

    #[tokio::test]
    async fn create_under_missing_farm_is_not_found() {
        let svc = service_with_farm().await;
        assert!(matches!(
            svc.create(&ctx(), 999, "Pond X").await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            svc.get_all(&ctx(), 999, "", 0, 0).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn created_pond_reports_farm_name() {
        let svc = service_with_farm().await;
        assert!(svc.create(&ctx(), 1, " Pond A ").await.is_ok());
        let Ok(pond) = svc.get_one(&ctx(), 1, 1).await else {
            panic!("pond missing");
        };
        assert_eq!(pond.farm_name, "Farm A");
        assert_eq!(pond.name, "Pond A");
    }

    #[tokio::test]
    async fn list_shapes_page() {
        let svc = service_with_farm().await;
        for i in 0..3 {
            assert!(svc.create(&ctx(), 1, &format!("Pond {i}")).await.is_ok());
        }
        let Ok(page) = svc.get_all(&ctx(), 1, "", 1, 2).await else {
            panic!("list failed");
        };
        assert_eq!(page.pagination, Pagination { limit: 1, page: 2 });
        assert_eq!(page.total_page, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_store() {
        let svc = service_with_farm().await;
        assert!(matches!(
            svc.create(&ctx(), 999, "").await,
            Err(ApiError::MissingRequiredAttribute(_))
        ));
        assert!(matches!(
            svc.update(&ctx(), 1, 1, " ").await,
            Err(ApiError::MissingRequiredAttribute(_))
        ));
    }

    #[tokio::test]
    async fn update_then_delete() {
        let svc = service_with_farm().await;
        assert!(svc.create(&ctx(), 1, "Pond A").await.is_ok());
        assert!(svc.update(&ctx(), 1, 1, "Pond B").await.is_ok());
        let Ok(pond) = svc.get_one(&ctx(), 1, 1).await else {
            panic!("pond missing");
        };
        assert_eq!(pond.name, "Pond B");
        assert!(svc.delete(&ctx(), 1).await.is_ok());
        assert!(matches!(svc.delete(&ctx(), 1).await, Err(ApiError::NotFound)));
    }
}
