//! # Store Capabilities
//!
//! The narrow interfaces the resolver and reconciler depend on.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Capability Traits                                  │
//! │                                                                         │
//! │  DiscountResolver ──► PromotionStore ──┐                                │
//! │                   └─► CouponStore ─────┼──► impl for sweets_db::Database│
//! │  CartReconciler ────► ProductCatalog ──┘                                │
//! │                   └─► CartStore                                         │
//! │                          ├── ServerCartStore  (cart_items table)        │
//! │                          └── LocalCartStore   (in-process, guests)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes the cart owner key explicitly, so one store instance
//! serves all users (or all guest sessions).

mod local;
mod server;
mod sqlite;

pub use local::LocalCartStore;
pub use server::ServerCartStore;

use async_trait::async_trait;
use thiserror::Error;

use sweets_core::{CartLine, Coupon, Product, Promotion};
use sweets_db::DbError;

// =============================================================================
// Errors
// =============================================================================

/// Failure reaching or reading a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Cart store lock poisoned")]
    Poisoned,

    #[error("Invalid cart snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl StoreError {
    /// Connection and pool failures. Everything else fails the same way again.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Db(e) => e.is_unavailable(),
            StoreError::Poisoned | StoreError::Snapshot(_) => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Catalog & Discounts
// =============================================================================

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product whether or not it is active.
    async fn find_product(&self, product_id: &str) -> StoreResult<Option<Product>>;
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Exact-match lookup by coupon code. Liveness is the caller's concern.
    async fn find_promotion_by_code(&self, code: &str) -> StoreResult<Option<Promotion>>;

    async fn count_usages(&self, promotion_id: &str) -> StoreResult<i64>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;
}

// =============================================================================
// Carts
// =============================================================================

/// Outcome of [`CartStore::increment_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWrite {
    /// Written; carries the line's new quantity.
    Applied(i64),
    /// Would exceed the ceiling; nothing written.
    Rejected,
}

/// Storage for cart lines keyed by (owner, product).
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn lines(&self, owner: &str) -> StoreResult<Vec<CartLine>>;

    async fn find_line(&self, owner: &str, product_id: &str) -> StoreResult<Option<CartLine>>;

    /// Adds `line.quantity` to the owner's line for that product, or inserts
    /// `line`, as one atomic step bounded by `ceiling`.
    async fn increment_line(
        &self,
        owner: &str,
        line: CartLine,
        ceiling: i64,
    ) -> StoreResult<LineWrite>;

    /// Returns `false` when there is no such line.
    async fn replace_quantity(&self, owner: &str, product_id: &str, quantity: i64)
        -> StoreResult<bool>;

    /// Returns `false` when there was no such line.
    async fn delete_line(&self, owner: &str, product_id: &str) -> StoreResult<bool>;

    async fn delete_all(&self, owner: &str) -> StoreResult<()>;
}
