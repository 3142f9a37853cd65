//! # Error Types
//!
//! Domain-specific error types for sweets-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sweets-core errors (this file)                                        │
//! │  ├── DiscountError    - Coupon / promotion resolution failures         │
//! │  ├── CartError        - Cart reconciliation failures                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sweets-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storefront errors (in app)                                            │
//! │  └── ApiError         - What the web frontend sees (serialized)        │
//! │                                                                         │
//! │  Flow: DbError → StoreUnavailable → ApiError → Frontend                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! 1. `thiserror` derives, no manual `Display` impls
//! 2. Messages are shown to shoppers as-is
//! 3. `StoreUnavailable` is the only variant worth retrying

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Discount Error
// =============================================================================

/// Which catalogue a code matched, for usage-limit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSource {
    Promotion,
    Coupon,
}

impl std::fmt::Display for DiscountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountSource::Promotion => f.write_str("Promotion"),
            DiscountSource::Coupon => f.write_str("Coupon"),
        }
    }
}

/// Reasons a code cannot be applied to an order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscountError {
    /// Empty code submitted.
    #[error("Coupon code is required")]
    CodeRequired,

    /// Order value below zero.
    #[error("Order value cannot be negative: {0}")]
    InvalidOrderValue(Money),

    /// No live promotion or coupon carries this code.
    ///
    /// ## When This Occurs
    /// - Code does not exist
    /// - Code exists but is inactive
    /// - Current time is outside the validity window
    #[error("Invalid or expired coupon code")]
    InvalidOrExpiredCode,

    /// The promotion or coupon has been redeemed its maximum number of times.
    #[error("{origin} usage limit exceeded")]
    UsageLimitExceeded { origin: DiscountSource },

    /// Order value is below the required minimum.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart total ₹400 ──► apply "WELCOME10" (min ₹500)
    ///      │
    ///      ▼
    /// "Minimum order value of ₹500.00 required"
    /// ```
    #[error("Minimum order value of {minimum} required")]
    MinimumOrderNotMet { minimum: Money },

    /// A backing store could not be reached. Safe to retry.
    #[error("Discount lookup unavailable: {0}")]
    StoreUnavailable(String),

    /// The store answered with an error that a retry would repeat.
    #[error("Discount lookup failed: {0}")]
    StoreFailed(String),
}

impl DiscountError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DiscountError::StoreUnavailable(_))
    }
}

// =============================================================================
// Cart Error
// =============================================================================

/// Reasons a cart mutation was rejected. No partial update is ever applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    /// Product id unknown or product deactivated.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested cumulative quantity exceeds stock.
    ///
    /// ```text
    /// Line GJ001 ×45, add 10, inventory 50
    ///      │
    ///      ▼
    /// InsufficientInventory { available: 50, requested: 55 }
    /// ```
    #[error("Insufficient inventory for {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// `set_quantity` on a product that is not in the cart.
    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    /// A backing store could not be reached. Safe to retry.
    #[error("Cart storage unavailable: {0}")]
    StoreUnavailable(String),

    /// Constraint violation, corrupt snapshot, poisoned lock. Not retryable.
    #[error("Cart storage failed: {0}")]
    StoreFailed(String),
}

impl CartError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::StoreUnavailable(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business rule runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    Negative { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience aliases.
pub type DiscountResult<T> = Result<T, DiscountError>;
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_order_message_mentions_minimum() {
        let err = DiscountError::MinimumOrderNotMet {
            minimum: Money::from_rupees(500),
        };
        assert_eq!(err.to_string(), "Minimum order value of ₹500.00 required");
    }

    #[test]
    fn test_usage_limit_messages() {
        let promo = DiscountError::UsageLimitExceeded {
            origin: DiscountSource::Promotion,
        };
        let coupon = DiscountError::UsageLimitExceeded {
            origin: DiscountSource::Coupon,
        };
        assert_eq!(promo.to_string(), "Promotion usage limit exceeded");
        assert_eq!(coupon.to_string(), "Coupon usage limit exceeded");
    }

    #[test]
    fn test_insufficient_inventory_message() {
        let err = CartError::InsufficientInventory {
            product_id: "GJ001".to_string(),
            available: 50,
            requested: 60,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient inventory for GJ001: available 50, requested 60"
        );
    }

    #[test]
    fn test_only_store_failures_are_retryable() {
        assert!(DiscountError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!DiscountError::InvalidOrExpiredCode.is_retryable());
        assert!(CartError::StoreUnavailable("pool closed".into()).is_retryable());
        assert!(!CartError::LineNotFound("p1".into()).is_retryable());
        assert!(!CartError::StoreFailed("CHECK constraint failed".into()).is_retryable());
        assert!(!DiscountError::StoreFailed("bad row".into()).is_retryable());
    }
}
