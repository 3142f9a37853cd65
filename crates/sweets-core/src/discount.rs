//! # Discount Policy
//!
//! Pure evaluation of promotions and coupons against an order value.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Resolving a code at checkout                        │
//! │                                                                         │
//! │   code ──► live promotion with this coupon_code?                        │
//! │               │                         │                               │
//! │              yes                        no                              │
//! │               ▼                         ▼                               │
//! │   evaluate_promotion()          evaluate_coupon()                       │
//! │   ├── usage count vs max_uses   ├── active + valid_from..=valid_until   │
//! │   ├── min_order                 ├── used_count vs usage_limit           │
//! │   └── amount by kind            ├── min_order_value                     │
//! │                                 └── amount, capped by max_discount      │
//! │                                                                         │
//! │   A live promotion always wins over a coupon sharing its code.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups happen elsewhere. Everything here is deterministic: the same
//! records, counts, and order value always give the same outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{DiscountError, DiscountResult, DiscountSource};
use crate::money::Money;
use crate::types::{Coupon, CouponKind, Promotion, PromotionKind};

// =============================================================================
// Outcomes
// =============================================================================

/// A discount granted by a promotional campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionDiscount {
    pub promotion_id: String,
    pub name: String,
    pub kind: PromotionKind,
    pub value: i64,
    pub discount: Money,
    pub min_order: Option<Money>,
    pub combinable: bool,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    /// `None` when the promotion has no usage cap.
    pub uses_left: Option<i64>,
}

/// A discount granted by a standalone coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponDiscount {
    pub coupon_id: String,
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    pub discount: Money,
    pub min_order_value: Option<Money>,
    pub max_discount: Option<Money>,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    pub uses_left: Option<i64>,
}

/// What a successfully resolved code grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum DiscountOutcome {
    Promotion(PromotionDiscount),
    Coupon(CouponDiscount),
}

impl DiscountOutcome {
    /// The monetary discount, whichever path produced it.
    pub fn discount(&self) -> Money {
        match self {
            DiscountOutcome::Promotion(p) => p.discount,
            DiscountOutcome::Coupon(c) => c.discount,
        }
    }

    pub fn source(&self) -> DiscountSource {
        match self {
            DiscountOutcome::Promotion(_) => DiscountSource::Promotion,
            DiscountOutcome::Coupon(_) => DiscountSource::Coupon,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            DiscountOutcome::Promotion(p) => p.expires_at,
            DiscountOutcome::Coupon(c) => c.expires_at,
        }
    }
}

// =============================================================================
// Request Checks
// =============================================================================

/// Rejects malformed requests before any lookup.
pub fn check_request(code: &str, order_value: Money) -> DiscountResult<()> {
    if code.is_empty() {
        return Err(DiscountError::CodeRequired);
    }
    if order_value.is_negative() {
        return Err(DiscountError::InvalidOrderValue(order_value));
    }
    Ok(())
}

// =============================================================================
// Promotion Path
// =============================================================================

/// Order-level amount for a promotion kind.
///
/// Structural kinds (`BOGO`, `BUNDLE`, `FLASH`) act on line items and
/// contribute nothing here.
pub fn promotion_amount(kind: PromotionKind, value: i64, order_value: Money) -> Money {
    match kind {
        PromotionKind::Percentage => order_value.percentage(value),
        PromotionKind::Fixed => Money::from_paise(value),
        PromotionKind::Bogo | PromotionKind::Bundle | PromotionKind::Flash => Money::zero(),
    }
}

/// Evaluates a promotion that has already been found live for `now`.
///
/// `usage_count` is the number of recorded redemptions so far.
pub fn evaluate_promotion(
    promotion: &Promotion,
    usage_count: i64,
    order_value: Money,
) -> DiscountResult<PromotionDiscount> {
    let max_uses = promotion.max_uses();
    if let Some(max) = max_uses {
        if usage_count >= max {
            return Err(DiscountError::UsageLimitExceeded {
                origin: DiscountSource::Promotion,
            });
        }
    }

    let min_order = promotion.min_order();
    if let Some(minimum) = min_order {
        if order_value < minimum {
            return Err(DiscountError::MinimumOrderNotMet { minimum });
        }
    }

    let discount = promotion_amount(promotion.kind, promotion.value, order_value);

    Ok(PromotionDiscount {
        promotion_id: promotion.id.clone(),
        name: promotion.name.clone(),
        kind: promotion.kind,
        value: promotion.value,
        discount: non_negative(discount),
        min_order,
        combinable: promotion.combinable,
        expires_at: promotion.end_at,
        uses_left: max_uses.map(|max| max - usage_count),
    })
}

// =============================================================================
// Coupon Path
// =============================================================================

pub fn coupon_amount(coupon: &Coupon, order_value: Money) -> Money {
    match coupon.kind {
        CouponKind::Percentage => {
            let raw = order_value.percentage(coupon.value);
            match coupon.max_discount() {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        CouponKind::Fixed => Money::from_paise(coupon.value),
    }
}

/// Evaluates a coupon, including its own liveness check.
///
/// ## Errors
/// - `InvalidOrExpiredCode` when inactive or outside `valid_from..=valid_until`
/// - `UsageLimitExceeded` when `used_count` has reached `usage_limit`
/// - `MinimumOrderNotMet` when below `min_order_value`
pub fn evaluate_coupon(
    coupon: &Coupon,
    order_value: Money,
    now: DateTime<Utc>,
) -> DiscountResult<CouponDiscount> {
    if !coupon.is_live_at(now) {
        return Err(DiscountError::InvalidOrExpiredCode);
    }

    let usage_limit = coupon.usage_limit();
    if let Some(limit) = usage_limit {
        if coupon.used_count >= limit {
            return Err(DiscountError::UsageLimitExceeded {
                origin: DiscountSource::Coupon,
            });
        }
    }

    let min_order_value = coupon.min_order_value();
    if let Some(minimum) = min_order_value {
        if order_value < minimum {
            return Err(DiscountError::MinimumOrderNotMet { minimum });
        }
    }

    Ok(CouponDiscount {
        coupon_id: coupon.id.clone(),
        code: coupon.code.clone(),
        kind: coupon.kind,
        value: coupon.value,
        discount: non_negative(coupon_amount(coupon, order_value)),
        min_order_value,
        max_discount: coupon.max_discount(),
        expires_at: coupon.valid_until,
        uses_left: usage_limit.map(|limit| limit - coupon.used_count),
    })
}

// =============================================================================
// Order-Level Application
// =============================================================================

/// Order total after a discount, never below zero.
///
/// Resolution itself does not clamp against the order value; checkout does.
pub fn discounted_total(order_value: Money, discount: Money) -> Money {
    let total = order_value - discount;
    if total.is_negative() {
        Money::zero()
    } else {
        total
    }
}

#[inline]
fn non_negative(amount: Money) -> Money {
    if amount.is_negative() {
        Money::zero()
    } else {
        amount
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
