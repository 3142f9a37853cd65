//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Promotion     │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, sku, slug  │   │  kind, value    │   │  code (unique)  │       │
//! │  │  price_paise    │   │  coupon_code?   │   │  used_count     │       │
//! │  │  inventory_qty  │   │  start..=end    │   │  from..=until   │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1:N                                   │
//! │                        ┌────────▼────────┐                              │
//! │                        │ PromotionUsage  │  one row per redemption      │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount Values
//! `value` on promotions and coupons is an integer in hundredths:
//! - percentage kinds: basis points (`1000` = 10%)
//! - amount kinds: paise (`5000` = ₹50.00)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// Treats a present-but-non-positive limit the same as an absent one.
///
/// Caps and minimums stored as `0` mean "no limit".
#[inline]
pub fn effective_limit(limit: Option<i64>) -> Option<i64> {
    limit.filter(|value| *value > 0)
}

/// Generates a new entity identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit, e.g. `GJ001`.
    pub sku: String,

    pub name: String,

    /// URL slug, e.g. `gulab-jamun`.
    pub slug: String,

    pub description: Option<String>,

    /// Price in paise.
    pub price_paise: i64,

    /// Image paths, first one is the primary image.
    pub images: Vec<String>,

    pub category_id: Option<String>,

    /// Units currently available to sell.
    pub inventory_qty: i64,

    /// Inactive products cannot be added to carts.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Checks whether `quantity` units can be held in a cart.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.inventory_qty >= quantity
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

// =============================================================================
// Discount Kinds
// =============================================================================

/// How a promotion discounts an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionKind {
    /// `value` basis points off the order value.
    Percentage,
    /// `value` paise off the order.
    Fixed,
    /// Buy one get one. Applied as free line items, not as an amount.
    Bogo,
    /// Bundle pricing. Applied to line items, not as an amount.
    Bundle,
    /// Time-boxed flash sale. Applied to line items, not as an amount.
    Flash,
}

impl PromotionKind {
    /// Whether this kind yields a monetary discount at order level.
    pub const fn is_monetary(&self) -> bool {
        matches!(self, PromotionKind::Percentage | PromotionKind::Fixed)
    }
}

/// How a plain coupon discounts an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    Percentage,
    Fixed,
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotional campaign, optionally redeemable through a coupon code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub kind: PromotionKind,

    /// Basis points for `Percentage`, paise for `Fixed`.
    pub value: i64,

    /// Minimum order value in paise.
    pub min_order_paise: Option<i64>,

    /// Code customers type at checkout. Unique across promotions.
    pub coupon_code: Option<String>,

    /// Total redemptions allowed across all customers.
    pub max_uses: Option<i64>,

    /// Redemptions allowed per customer.
    pub user_limit: Option<i64>,

    #[ts(as = "String")]
    pub start_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub end_at: DateTime<Utc>,

    /// Whether this promotion may stack with other discounts.
    pub combinable: bool,

    pub active: bool,

    /// Products this promotion is scoped to (empty = all).
    pub product_ids: Vec<String>,

    /// Categories this promotion is scoped to (empty = all).
    pub category_ids: Vec<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Active and `start_at <= now <= end_at`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.start_at <= now && now <= self.end_at
    }

    pub fn min_order(&self) -> Option<Money> {
        effective_limit(self.min_order_paise).map(Money::from_paise)
    }

    pub fn max_uses(&self) -> Option<i64> {
        effective_limit(self.max_uses)
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A standalone coupon code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub kind: CouponKind,

    /// Basis points for `Percentage`, paise for `Fixed`.
    pub value: i64,

    pub min_order_value_paise: Option<i64>,

    /// Upper bound on a `Percentage` discount, in paise.
    pub max_discount_paise: Option<i64>,

    pub usage_limit: Option<i64>,

    /// Completed redemptions so far.
    pub used_count: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,

    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Active and `valid_from <= now <= valid_until`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_until
    }

    pub fn min_order_value(&self) -> Option<Money> {
        effective_limit(self.min_order_value_paise).map(Money::from_paise)
    }

    pub fn max_discount(&self) -> Option<Money> {
        effective_limit(self.max_discount_paise).map(Money::from_paise)
    }

    pub fn usage_limit(&self) -> Option<i64> {
        effective_limit(self.usage_limit)
    }
}

// =============================================================================
// Promotion Usage
// =============================================================================

/// One completed redemption of a promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionUsage {
    pub id: String,
    pub promotion_id: String,
    pub user_id: Option<String>,
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub used_at: DateTime<Utc>,
}

impl PromotionUsage {
    /// Creates a usage record stamped with the current time.
    pub fn new(
        promotion_id: impl Into<String>,
        user_id: Option<String>,
        order_id: Option<String>,
    ) -> Self {
        PromotionUsage {
            id: new_id(),
            promotion_id: promotion_id.into(),
            user_id,
            order_id,
            used_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
