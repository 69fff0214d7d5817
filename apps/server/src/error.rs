//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Error Flow                                       │
//! │                                                                         │
//! │  tally-core                 tally-db                  tally-server      │
//! │  ──────────                 ────────                  ────────────      │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► DbError::Domain ──┐                              │
//! │                   │    DbError::* ───────┼──► ApiError ──► HTTP status  │
//! │                   └──────────────────────┘      │                       │
//! │                                                 ▼                       │
//! │                                   { "error": "<message>" }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | Code                | Status | Example message                              |
//! |---------------------|--------|----------------------------------------------|
//! | `ValidationError`   | 400    | `quantity must be positive`                  |
//! | `StockInsufficient` | 400    | `Not enough stock for Coffee. Only 1 left.`  |
//! | `NotFound`          | 404    | `Product 99 not found.`                      |
//! | `Conflict`          | 409    | `Duplicate sku: 'CF-001' already exists`     |
//! | `StoreFailure`      | 500    | storage message, verbatim                    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;
use tracing::error;

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from HTTP handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable category; decides the status code.
    pub code: ErrorCode,

    /// Human-readable message, sent to the client as `error`.
    pub message: String,
}

/// Error categories for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or out-of-range input (400)
    ValidationError,

    /// A cart line asks for more than is on hand (400)
    StockInsufficient,

    /// Unknown product or order (404)
    NotFound,

    /// Unique constraint, e.g. a SKU already in use (409)
    Conflict,

    /// Storage failed (500)
    StoreFailure,
}

impl ErrorCode {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::StockInsufficient => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// Creates a store failure carrying the storage message.
    pub fn store(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::StoreFailure, message)
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::StockInsufficient, err.to_string())
            }
            CoreError::EmptyCart => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::ConnectionFailed(message)
            | DbError::MigrationFailed(message)
            | DbError::QueryFailed(message)
            | DbError::TransactionFailed(message)
            | DbError::Internal(message)
            | DbError::ForeignKeyViolation { message } => ApiError::store(message),
            DbError::PoolExhausted => ApiError::store(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = ?self.code, message = %self.message, "Request failed");
        }
        (status, Json(json!({ "error": self.message }))).into_response()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
