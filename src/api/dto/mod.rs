//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod farm_dto;
pub mod pond_dto;
pub mod telemetry_dto;

pub use common_dto::*;
pub use farm_dto::*;
pub use pond_dto::*;
pub use telemetry_dto::*;
