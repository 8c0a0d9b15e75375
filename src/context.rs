//! Request-scoped context passed explicitly through services and stores.
//!
//! A [`RequestContext`] carries the correlation id assigned at the edge
//! (`x-request-id`) and an optional deadline. Stores run each operation
//! through [`RequestContext::bounded`]: when the deadline passes, the
//! operation's future is dropped, which rolls back any open transaction.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::time::Instant;

use crate::error::ApiError;

/// Header carrying the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id plus cancellation deadline for one logical request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with the given correlation id and no deadline.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
        }
    }

    /// Creates a context with a fresh UUID v4 correlation id.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Returns a copy of this context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// The correlation id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Same correlation id, no deadline. Used for work that must finish
    /// even after the client-facing response is produced.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::new(self.request_id.clone())
    }

    /// Runs `fut` until it completes or the deadline passes.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or [`ApiError::Unknown`] when the
    /// deadline expires first.
    pub async fn bounded<F, T>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let Some(deadline) = self.deadline else {
            return fut.await;
        };
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(request_id = %self.request_id, "request deadline exceeded");
                Err(ApiError::Unknown("request deadline exceeded".to_string()))
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<Self>() {
            return Ok(ctx.clone());
        }
        let ctx = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(Self::generate, Self::new);
        Ok(ctx)
    }
}
