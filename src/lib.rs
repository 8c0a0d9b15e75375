//! # farm-gateway
//!
//! REST API for managing farms, the ponds they contain, and request
//! telemetry.
//!
//! Farms and ponds are soft-deleted: a deleted row stays in the store but
//! is invisible to every read and frees its name for reuse. Each write
//! runs its existence and duplicate-name checks inside one transaction.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + request-metric middleware (api/)
//!     │
//!     ├── FarmService / PondService / TelemetryService (service/)
//!     │
//!     ├── FarmStore / PondStore / TelemetryStore (persistence/)
//!     │       ├── PostgreSQL (sqlx)
//!     │       └── MemoryStore
//!     │
//!     └── PostgreSQL
//! ```
//!
//! Every service and store call receives a [`context::RequestContext`]
//! carrying the request id and deadline.

pub mod api;
pub mod app_state;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
