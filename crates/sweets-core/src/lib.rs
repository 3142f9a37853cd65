//! # sweets-core: Pure Business Logic for the Sweets Storefront
//!
//! Discount policy, cart rules, money, and domain types. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sweets Storefront Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Product page ──► Cart drawer ──► Checkout (apply coupon)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/storefront                              │   │
//! │  │    DiscountResolver, CartReconciler, cart stores, commands      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sweets-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ discount  │  │   cart    │  │   │
//! │  │   │  Product  │  │   Money   │  │ promotion │  │ CartLine  │  │   │
//! │  │   │  Coupon   │  │  bps math │  │  coupon   │  │ CartTotals│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    sweets-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Promotion, Coupon, PromotionUsage)
//! - [`money`] - Money in paise with basis-point percentages
//! - [`discount`] - Promotion and coupon evaluation
//! - [`cart`] - Cart lines, totals, and mutation rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use sweets_core::money::Money;
//!
//! let price = Money::from_rupees(280);
//! let subtotal = price * 2;
//! assert_eq!(subtotal.to_string(), "₹560.00");
//!
//! // 10% off, in basis points
//! assert_eq!(subtotal.percentage(1000), Money::from_rupees(56));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, CartView};
pub use discount::{CouponDiscount, DiscountOutcome, PromotionDiscount};
pub use error::{CartError, DiscountError, DiscountSource, ValidationError};
pub use money::Money;
pub use types::*;
