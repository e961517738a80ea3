//! # API Error Type
//!
//! What HTTP clients see when a request fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Toko POS                               │
//! │                                                                         │
//! │  handler ── db.checkout().checkout_cart(..) ──► Err(DbError)           │
//! │                                                    │                    │
//! │                  ┌─────────────────────────────────┴───────┐           │
//! │                  ▼                                         ▼           │
//! │        DbError::Domain(CoreError)               anything else          │
//! │        message passed through                   logged with error!     │
//! │        404 / 409 / 422 / 400                    generic 500            │
//! │                                                                         │
//! │  Client receives:                                                      │
//! │  { "code": "INSUFFICIENT_STOCK",                                       │
//! │    "message": "Insufficient stock for product p-1: requested 3, ..." } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use toko_core::CoreError;
use toko_db::DbError;

/// API error returned from every route.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Invoice not found: 6f1c..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Checkout with nothing in it (422)
    EmptyCart,

    /// Not enough on the shelf (409)
    InsufficientStock,

    /// Order already finished or cancelled (409)
    TerminalState,

    /// Status move not allowed for this order type (409)
    InvalidTransition,

    /// Someone else changed the order first (409)
    Conflict,

    /// Cart limits (422)
    CartError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::EmptyCart | ErrorCode::CartError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InsufficientStock
            | ErrorCode::TerminalState
            | ErrorCode::InvalidTransition
            | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    fn database(message: &str) -> Self {
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

/// Converts core errors to API errors. Messages pass through unchanged.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            e if e.is_not_found() => ErrorCode::NotFound,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InsufficientStock { .. } | CoreError::StockExceeded { .. } => {
                ErrorCode::InsufficientStock
            }
            CoreError::TerminalState { .. } => ErrorCode::TerminalState,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::InvalidDiscount { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
            _ => ErrorCode::Internal,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
///
/// Only business-rule failures keep their message. Everything else is
/// logged here and reported generically.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Conflict { entity, id } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} {} was changed concurrently, try again", entity, id),
            ),
            DbError::UniqueViolation { field, .. } => {
                ApiError::validation(format!("{} already exists", field))
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::database("Database is busy")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::database("Database operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;
