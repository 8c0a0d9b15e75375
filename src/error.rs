//! Gateway error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the gateway. Stores, services
//! and handlers all return it; the request boundary turns each variant into
//! a fixed HTTP status and a numeric code inside the standard response
//! envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// PostgreSQL SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Response envelope shared by every endpoint.
///
/// ```json
/// { "data": { "id": 1, "name": "Farm A" }, "error": null }
/// { "data": null, "error": { "code": 404015, "message": "entity not found" } }
/// ```
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Payload on success, `null` otherwise.
    pub data: Option<T>,
    /// Error body on failure, `null` otherwise.
    pub error: Option<ErrorBody>,
}

impl<T: Serialize> Envelope<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub const fn data(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    /// Success envelope without a payload (`data: null`).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

/// Error envelope as documented in the OpenAPI schema.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `null` for errors.
    pub data: Option<serde_json::Value>,
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric code laid out as `HTTPSTATUS-CATEGORY-INDEX`
    /// (e.g. `404015`: 404, basic category, error #5).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Codes
///
/// | Variant                    | HTTP | Code   |
/// |----------------------------|------|--------|
/// | `BadRequest`               | 400  | 400011 |
/// | `MissingRequiredAttribute` | 400  | 400012 |
/// | `NotFound`                 | 404  | 404015 |
/// | `DuplicatedResource`       | 409  | 409016 |
/// | `BrokenUserRequest`        | 422  | 422017 |
/// | `Unknown`                  | 500  | 500011 |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed path or query input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required attribute was absent or blank.
    #[error("attribute is missing: {0}")]
    MissingRequiredAttribute(&'static str),

    /// The addressed entity (or its parent) does not exist.
    #[error("entity not found")]
    NotFound,

    /// A non-deleted entity already holds the requested name.
    #[error("entity already existed")]
    DuplicatedResource,

    /// Request body could not be processed.
    #[error("invalid request: {0}")]
    BrokenUserRequest(String),

    /// Catch-all for store and internal failures.
    #[error("internal error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::BadRequest(_) => 400_011,
            Self::MissingRequiredAttribute(_) => 400_012,
            Self::NotFound => 404_015,
            Self::DuplicatedResource => 409_016,
            Self::BrokenUserRequest(_) => 422_017,
            Self::Unknown(_) => 500_011,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MissingRequiredAttribute(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DuplicatedResource => StatusCode::CONFLICT,
            Self::BrokenUserRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients. Internal detail stays in the logs.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad request",
            Self::MissingRequiredAttribute(_) => "attribute is missing",
            Self::NotFound => "entity not found",
            Self::DuplicatedResource => "entity already existed",
            Self::BrokenUserRequest(_) => "invalid request",
            Self::Unknown(_) => "internal server error",
        }
    }

    /// Builds the [`ErrorBody`] sent to clients.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.public_message().to_string(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::DuplicatedResource;
        }
        Self::Unknown(err.to_string())
    }
}

/// Returns `true` when the backend rejected a write on a unique index.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err
            .code()
            .is_some_and(|code| code == PG_UNIQUE_VIOLATION);
    }
    false
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BrokenUserRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body: Envelope<()> = Envelope {
            data: None,
            error: Some(self.body()),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
