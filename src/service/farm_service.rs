//! Farm service: list shaping and farm mutations.

use std::sync::Arc;

use super::{ListPage, log_forwarded, required_name};
use crate::context::RequestContext;
use crate::domain::{Farm, FarmQuery, Pagination};
use crate::error::ApiError;
use crate::persistence::FarmStore;

/// Orchestration layer for farm operations.
#[derive(Debug, Clone)]
pub struct FarmService {
    store: Arc<dyn FarmStore>,
}

impl FarmService {
    /// Creates a new `FarmService` over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn FarmStore>) -> Self {
        Self { store }
    }

    /// Lists non-deleted farms.
    ///
    /// `limit` and `page` are normalized first (see
    /// [`Pagination::normalize`]).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when no farm matches, or the store's
    /// error.
    pub async fn get_all(
        &self,
        ctx: &RequestContext,
        keyword: &str,
        limit: i64,
        page: i64,
    ) -> Result<ListPage<Farm>, ApiError> {
        let query = FarmQuery {
            keyword: keyword.trim().to_string(),
            pagination: Pagination::normalize(limit, page),
        };
        self.list(ctx, &query)
            .await
            .inspect_err(|e| log_forwarded(ctx, "farm.get_all", e))
    }

    async fn list(&self, ctx: &RequestContext, query: &FarmQuery) -> Result<ListPage<Farm>, ApiError> {
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

    /// Fetches one non-deleted farm.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the farm is absent or deleted.
    pub async fn get_one(&self, ctx: &RequestContext, id: i64) -> Result<Farm, ApiError> {
        self.store
            .get_one(ctx, id)
            .await
            .and_then(|farm| farm.ok_or(ApiError::NotFound))
            .inspect_err(|e| log_forwarded(ctx, "farm.get_one", e))
    }

    /// Creates a farm.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingRequiredAttribute`] for a blank name and
    /// [`ApiError::DuplicatedResource`] if the name is taken.
    pub async fn create(&self, ctx: &RequestContext, name: &str) -> Result<(), ApiError> {
        let result = match required_name(name) {
            Ok(name) => self.store.store(ctx, &name).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log_forwarded(ctx, "farm.create", e))
    }

    /// Renames farm `id`, creating a new farm if `id` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingRequiredAttribute`] for a blank name and
    /// [`ApiError::DuplicatedResource`] if another farm holds the name.
    pub async fn update(&self, ctx: &RequestContext, id: i64, name: &str) -> Result<(), ApiError> {
        let result = match required_name(name) {
            Ok(name) => self.store.upsert(ctx, &Farm { id, name }).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log_forwarded(ctx, "farm.update", e))
    }

    /// Soft-deletes a farm.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the farm is absent or already
    /// deleted.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        self.store
            .delete(ctx, id)
            .await
            .inspect_err(|e| log_forwarded(ctx, "farm.delete", e))
    }
}
