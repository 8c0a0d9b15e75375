//! Domain layer: entity shapes, store queries, and pagination rules.
//!
//! These types carry no persistence or HTTP concerns; stores read and
//! write them, services shape them into responses.

pub mod farm;
pub mod pagination;
pub mod pond;
pub mod request_log;

pub use farm::{Farm, FarmQuery};
pub use pagination::Pagination;
pub use pond::{Pond, PondQuery, PondWithFarm};
pub use request_log::{RequestLog, RequestMetricSummary};
