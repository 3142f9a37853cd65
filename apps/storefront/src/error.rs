//! # API Error Type
//!
//! Unified error type for storefront commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Web Frontend                 Rust Backend                              │
//! │  ────────────                 ────────────                              │
//! │                                                                         │
//! │  POST /cart/add  ───────────► add_to_cart()                             │
//! │                                  │                                      │
//! │                                  ├── CartError::InsufficientInventory   │
//! │                                  ├── DiscountError::MinimumOrderNotMet  │
//! │                                  ├── ValidationError::Required          │
//! │                                  └── DbError / StoreError               │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                              ApiError { code, message }                 │
//! │                                  │                                      │
//! │  ◄───────────────────────────────┘                                      │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient inventory for p-gj001: available 50, ..." } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shopper-facing messages from `sweets-core` pass through unchanged.
//! Storage failures are logged in full and replaced with a generic message.

use serde::Serialize;

use sweets_core::{CartError, DiscountError, ValidationError};
use sweets_db::DbError;

use crate::store::StoreError;

/// API error returned from storefront commands.
///
/// ```json
/// {
///   "code": "DISCOUNT_REJECTED",
///   "message": "Minimum order value of ₹500.00 required"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
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

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,

    /// Cart operation rejected (422)
    CartError,

    /// Requested quantity exceeds inventory (409)
    InsufficientStock,

    /// Code exists but cannot be applied to this order (422)
    DiscountRejected,

    /// Backing store unreachable, safe to retry (503)
    Unavailable,
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

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::Unavailable)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value out of range")
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Unavailable, "Database temporarily unavailable")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::Unavailable, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Db(e) => ApiError::from(e),
            StoreError::Poisoned => {
                tracing::error!("Guest cart store lock poisoned");
                ApiError::internal("Cart storage failed")
            }
            StoreError::Snapshot(e) => ApiError::validation(format!("Invalid cart snapshot: {}", e)),
        }
    }
}

impl From<DiscountError> for ApiError {
    fn from(err: DiscountError) -> Self {
        match err {
            DiscountError::CodeRequired | DiscountError::InvalidOrderValue(_) => {
                ApiError::validation(err.to_string())
            }
            DiscountError::InvalidOrExpiredCode => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DiscountError::UsageLimitExceeded { .. } | DiscountError::MinimumOrderNotMet { .. } => {
                ApiError::new(ErrorCode::DiscountRejected, err.to_string())
            }
            DiscountError::StoreUnavailable(detail) => {
                tracing::error!("Discount lookup failed: {}", detail);
                ApiError::new(ErrorCode::Unavailable, "Discounts temporarily unavailable")
            }
            DiscountError::StoreFailed(detail) => {
                tracing::error!("Discount store failed: {}", detail);
                ApiError::new(ErrorCode::DatabaseError, "Discount lookup failed")
            }
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity(_) => ApiError::validation(err.to_string()),
            CartError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CartError::LineNotFound(_) => ApiError::new(ErrorCode::CartError, err.to_string()),
            CartError::InsufficientInventory { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CartError::StoreUnavailable(detail) => {
                tracing::error!("Cart store failed: {}", detail);
                ApiError::new(ErrorCode::Unavailable, "Cart temporarily unavailable")
            }
            CartError::StoreFailed(detail) => {
                tracing::error!("Cart store failed: {}", detail);
                ApiError::new(ErrorCode::DatabaseError, "Cart storage failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
