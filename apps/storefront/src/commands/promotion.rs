//! # Promotion & Coupon Commands
//!
//! Checkout-facing code resolution, redemption recording at order
//! placement, and the admin console's promotion management.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout                                                               │
//! │    apply_coupon("WELCOME10", ₹3000) ──► DiscountResolver (read-only)    │
//! │         └──► { outcome, orderValue, discountedTotal }                   │
//! │                                                                         │
//! │  Order placed                                                           │
//! │    commit_redemption(outcome)                                           │
//! │         ├── Promotion ──► promotion_usages += 1 row                     │
//! │         └── Coupon ─────► coupons.used_count += 1                       │
//! │                                                                         │
//! │  Admin console                                                          │
//! │    create_promotion / update_promotion / list_promotions /              │
//! │    set_promotion_active / delete_promotion / create_coupon              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sweets_core::discount::discounted_total;
use sweets_core::validation::{
    validate_coupon_code, validate_name, validate_percentage_bps, validate_price,
};
use sweets_core::{
    new_id, Coupon, CouponKind, DiscountOutcome, Money, Promotion, PromotionKind, PromotionUsage,
    ValidationError,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
    pub order_value_paise: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponResponse {
    pub outcome: DiscountOutcome,
    pub order_value: Money,
    /// Order value less the discount, floored at zero.
    pub discounted_total: Money,
}

/// Resolves a code against the current order value.
///
/// Nothing is recorded; calling this twice yields the same answer.
pub async fn apply_coupon(
    state: &AppState,
    request: ApplyCouponRequest,
) -> Result<ApplyCouponResponse, ApiError> {
    debug!(code = %request.code, order_value = request.order_value_paise, "apply_coupon command");

    let order_value = Money::from_paise(request.order_value_paise);
    let outcome = state
        .discounts()
        .resolve(&request.code, order_value, Utc::now())
        .await?;

    Ok(ApplyCouponResponse {
        discounted_total: discounted_total(order_value, outcome.discount()),
        order_value,
        outcome,
    })
}

/// Records that an order used a resolved discount.
pub async fn commit_redemption(
    state: &AppState,
    outcome: &DiscountOutcome,
    user_id: Option<String>,
    order_id: Option<String>,
) -> Result<(), ApiError> {
    match outcome {
        DiscountOutcome::Promotion(granted) => {
            let usage = PromotionUsage::new(&granted.promotion_id, user_id, order_id);
            state.db().promotions().record_usage(&usage).await?;
            info!(promotion_id = %granted.promotion_id, "Promotion redemption recorded");
        }
        DiscountOutcome::Coupon(granted) => {
            let used = state
                .db()
                .coupons()
                .increment_used_count(&granted.coupon_id)
                .await?;
            info!(coupon_id = %granted.coupon_id, used_count = used, "Coupon redemption recorded");
        }
    }
    Ok(())
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionRequest {
    pub name: String,
    pub kind: PromotionKind,
    pub value: i64,
    pub min_order_paise: Option<i64>,
    pub coupon_code: Option<String>,
    pub max_uses: Option<i64>,
    pub user_limit: Option<i64>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub combinable: bool,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub code: String,
    pub kind: CouponKind,
    pub value: i64,
    pub min_order_value_paise: Option<i64>,
    pub max_discount_paise: Option<i64>,
    pub usage_limit: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

fn validate_window(field: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not be before the start".to_string(),
        });
    }
    Ok(())
}

fn validate_value(is_percentage: bool, value: i64) -> Result<(), ValidationError> {
    if is_percentage {
        validate_percentage_bps(value)
    } else {
        validate_price(Money::from_paise(value))
    }
}

fn validate_promotion(request: &CreatePromotionRequest) -> Result<(), ValidationError> {
    validate_name("name", &request.name)?;
    validate_value(request.kind == PromotionKind::Percentage, request.value)?;
    if let Some(code) = &request.coupon_code {
        validate_coupon_code(code)?;
    }
    validate_window("endAt", request.start_at, request.end_at)
}

pub async fn create_promotion(
    state: &AppState,
    request: CreatePromotionRequest,
) -> Result<Promotion, ApiError> {
    validate_promotion(&request)?;

    let now = Utc::now();
    let promotion = Promotion {
        id: new_id(),
        name: request.name.trim().to_string(),
        kind: request.kind,
        value: request.value,
        min_order_paise: request.min_order_paise,
        coupon_code: request.coupon_code,
        max_uses: request.max_uses,
        user_limit: request.user_limit,
        start_at: request.start_at,
        end_at: request.end_at,
        combinable: request.combinable,
        active: true,
        product_ids: request.product_ids,
        category_ids: request.category_ids,
        created_at: now,
        updated_at: now,
    };

    Ok(state.db().promotions().insert(&promotion).await?)
}

/// Replaces every editable field of an existing promotion.
///
/// The active flag, creation time and recorded usages are kept.
pub async fn update_promotion(
    state: &AppState,
    id: &str,
    request: CreatePromotionRequest,
) -> Result<Promotion, ApiError> {
    validate_promotion(&request)?;

    let existing = state
        .db()
        .promotions()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Promotion", id))?;

    let promotion = Promotion {
        name: request.name.trim().to_string(),
        kind: request.kind,
        value: request.value,
        min_order_paise: request.min_order_paise,
        coupon_code: request.coupon_code,
        max_uses: request.max_uses,
        user_limit: request.user_limit,
        start_at: request.start_at,
        end_at: request.end_at,
        combinable: request.combinable,
        product_ids: request.product_ids,
        category_ids: request.category_ids,
        updated_at: Utc::now(),
        ..existing
    };

    state.db().promotions().update(&promotion).await?;
    info!(id = %promotion.id, "Promotion updated");
    Ok(promotion)
}

/// All promotions, newest first.
pub async fn list_promotions(state: &AppState) -> Result<Vec<Promotion>, ApiError> {
    Ok(state.db().promotions().list().await?)
}

pub async fn set_promotion_active(state: &AppState, id: &str, active: bool) -> Result<(), ApiError> {
    Ok(state.db().promotions().set_active(id, active).await?)
}

pub async fn delete_promotion(state: &AppState, id: &str) -> Result<(), ApiError> {
    Ok(state.db().promotions().delete(id).await?)
}

pub async fn create_coupon(
    state: &AppState,
    request: CreateCouponRequest,
) -> Result<Coupon, ApiError> {
    validate_coupon_code(&request.code)?;
    validate_value(request.kind == CouponKind::Percentage, request.value)?;
    validate_window("validUntil", request.valid_from, request.valid_until)?;

    let now = Utc::now();
    let coupon = Coupon {
        id: new_id(),
        code: request.code,
        kind: request.kind,
        value: request.value,
        min_order_value_paise: request.min_order_value_paise,
        max_discount_paise: request.max_discount_paise,
        usage_limit: request.usage_limit,
        used_count: 0,
        is_active: true,
        valid_from: request.valid_from,
        valid_until: request.valid_until,
        created_at: now,
        updated_at: now,
    };

    Ok(state.db().coupons().insert(&coupon).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::seeded_state;
    use chrono::Duration;

    fn apply(code: &str, rupees: i64) -> ApplyCouponRequest {
        ApplyCouponRequest {
            code: code.to_string(),
            order_value_paise: Money::from_rupees(rupees).paise(),
        }
    }

    fn flat_promotion(code: &str, value: i64) -> CreatePromotionRequest {
        let now = Utc::now();
        CreatePromotionRequest {
            name: "Festive Flat Off".to_string(),
            kind: PromotionKind::Fixed,
            value,
            min_order_paise: None,
            coupon_code: Some(code.to_string()),
            max_uses: Some(1),
            user_limit: None,
            start_at: now - Duration::hours(1),
            end_at: now + Duration::days(1),
            combinable: false,
            product_ids: Vec::new(),
            category_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_apply_welcome10() {
        let state = seeded_state().await;

        let response = apply_coupon(&state, apply("WELCOME10", 3000)).await.unwrap();
        assert_eq!(response.outcome.discount(), Money::from_rupees(200));
        assert_eq!(response.discounted_total, Money::from_rupees(2800));

        let err = apply_coupon(&state, apply("WELCOME10", 400)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountRejected);
        assert!(err.message.contains("500"));
    }

    #[tokio::test]
    async fn test_apply_empty_and_unknown_codes() {
        let state = seeded_state().await;

        let err = apply_coupon(&state, apply("", 3000)).await.unwrap_err();
        assert_eq!(err.message, "Coupon code is required");

        let err = apply_coupon(&state, apply("welcome10", 3000)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_fixed_larger_than_order_floors_total() {
        let state = seeded_state().await;

        let response = apply_coupon(&state, apply("FIRST50", 30)).await.unwrap();
        assert_eq!(response.outcome.discount(), Money::from_rupees(50));
        assert_eq!(response.discounted_total, Money::zero());
    }

    #[tokio::test]
    async fn test_commit_coupon_redemption() {
        let state = seeded_state().await;

        let response = apply_coupon(&state, apply("WELCOME10", 3000)).await.unwrap();
        commit_redemption(&state, &response.outcome, Some("user-1".into()), None)
            .await
            .unwrap();

        let coupon = state.db().coupons().get_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 1);
    }

    #[tokio::test]
    async fn test_created_promotion_exhausts_after_redemption() {
        let state = seeded_state().await;
        create_promotion(&state, flat_promotion("FLAT100", 10_000)).await.unwrap();

        let response = apply_coupon(&state, apply("FLAT100", 1000)).await.unwrap();
        assert_eq!(response.outcome.discount(), Money::from_rupees(100));

        commit_redemption(&state, &response.outcome, None, Some("order-1".into()))
            .await
            .unwrap();

        let err = apply_coupon(&state, apply("FLAT100", 1000)).await.unwrap_err();
        assert_eq!(err.message, "Promotion usage limit exceeded");
    }

    #[tokio::test]
    async fn test_deactivated_promotion_falls_back_to_coupon() {
        let state = seeded_state().await;
        let promo = create_promotion(&state, flat_promotion("WELCOME10", 10_000))
            .await
            .unwrap();

        let response = apply_coupon(&state, apply("WELCOME10", 3000)).await.unwrap();
        assert!(matches!(response.outcome, DiscountOutcome::Promotion(_)));

        set_promotion_active(&state, &promo.id, false).await.unwrap();
        let response = apply_coupon(&state, apply("WELCOME10", 3000)).await.unwrap();
        assert!(matches!(response.outcome, DiscountOutcome::Coupon(_)));

        delete_promotion(&state, &promo.id).await.unwrap();
        let err = delete_promotion(&state, &promo.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_create_promotion_validation() {
        let state = seeded_state().await;

        let mut bad_window = flat_promotion("X1", 100);
        bad_window.end_at = bad_window.start_at - Duration::days(1);
        let err = create_promotion(&state, bad_window).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut bad_percent = flat_promotion("X2", 12_000);
        bad_percent.kind = PromotionKind::Percentage;
        assert!(create_promotion(&state, bad_percent).await.is_err());

        let mut blank = flat_promotion("X3", 100);
        blank.name = "   ".to_string();
        assert!(create_promotion(&state, blank).await.is_err());

        let duplicate = create_promotion(&state, flat_promotion("DIWALI20", 100))
            .await
            .unwrap_err();
        assert_eq!(duplicate.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_promotion() {
        let state = seeded_state().await;
        let promo = create_promotion(&state, flat_promotion("FLAT100", 10_000))
            .await
            .unwrap();

        let mut edit = flat_promotion("FLAT150", 15_000);
        edit.name = "  Bigger Flat Off ".to_string();
        let updated = update_promotion(&state, &promo.id, edit).await.unwrap();
        assert_eq!(updated.id, promo.id);
        assert_eq!(updated.name, "Bigger Flat Off");

        let response = apply_coupon(&state, apply("FLAT150", 1000)).await.unwrap();
        assert_eq!(response.outcome.discount(), Money::from_rupees(150));
        let err = apply_coupon(&state, apply("FLAT100", 1000)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = update_promotion(&state, "no-such-promotion", flat_promotion("X9", 100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut bad_window = flat_promotion("X8", 100);
        bad_window.end_at = bad_window.start_at - Duration::days(1);
        let err = update_promotion(&state, &promo.id, bad_window).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_list_and_create_coupon() {
        let state = seeded_state().await;
        assert_eq!(list_promotions(&state).await.unwrap().len(), 1);

        let now = Utc::now();
        let coupon = create_coupon(
            &state,
            CreateCouponRequest {
                code: "SWEET15".to_string(),
                kind: CouponKind::Percentage,
                value: 1500,
                min_order_value_paise: None,
                max_discount_paise: None,
                usage_limit: None,
                valid_from: now - Duration::hours(1),
                valid_until: now + Duration::days(30),
            },
        )
        .await
        .unwrap();
        assert_eq!(coupon.used_count, 0);

        let response = apply_coupon(&state, apply("SWEET15", 1000)).await.unwrap();
        assert_eq!(response.outcome.discount(), Money::from_rupees(150));
    }
}
