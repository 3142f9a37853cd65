//! # Discount Resolver
//!
//! Turns a code typed at checkout into a discount, or a reason it can't be
//! applied.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve("DIWALI20", ₹1000, now)                                        │
//! │       │                                                                 │
//! │       ├── empty code? ───────────────────────► CodeRequired             │
//! │       ├── negative order value? ─────────────► InvalidOrderValue        │
//! │       ▼                                                                 │
//! │  PromotionStore::find_promotion_by_code                                 │
//! │       │                                                                 │
//! │       ├── found and live ──► count_usages ──► evaluate_promotion        │
//! │       │                                                                 │
//! │       ▼ (absent, inactive, or out of window)                            │
//! │  CouponStore::find_coupon_by_code                                       │
//! │       │                                                                 │
//! │       ├── absent ───────────────────────────► InvalidOrExpiredCode      │
//! │       └── found ──────────────────────────────► evaluate_coupon         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver only reads. Redemptions are recorded when an order is
//! placed, never here.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use sweets_core::discount::{check_request, evaluate_coupon, evaluate_promotion};
use sweets_core::{DiscountError, DiscountOutcome, Money};

use crate::store::{CouponStore, PromotionStore, StoreError};

pub struct DiscountResolver<'a> {
    promotions: &'a dyn PromotionStore,
    coupons: &'a dyn CouponStore,
}

impl<'a> DiscountResolver<'a> {
    pub fn new(promotions: &'a dyn PromotionStore, coupons: &'a dyn CouponStore) -> Self {
        DiscountResolver {
            promotions,
            coupons,
        }
    }

    /// Resolves `code` against `order_value` at instant `now`.
    ///
    /// A live promotion always wins over a coupon sharing its code.
    pub async fn resolve(
        &self,
        code: &str,
        order_value: Money,
        now: DateTime<Utc>,
    ) -> Result<DiscountOutcome, DiscountError> {
        check_request(code, order_value)?;

        let promotion = self
            .promotions
            .find_promotion_by_code(code)
            .await
            .map_err(store_error)?;

        if let Some(promotion) = promotion.filter(|p| p.is_live_at(now)) {
            let usage_count = self
                .promotions
                .count_usages(&promotion.id)
                .await
                .map_err(store_error)?;

            let granted = evaluate_promotion(&promotion, usage_count, order_value)?;
            info!(
                code = %code,
                promotion_id = %granted.promotion_id,
                discount = %granted.discount,
                "Promotion applied"
            );
            return Ok(DiscountOutcome::Promotion(granted));
        }

        debug!(code = %code, "No live promotion, trying coupons");

        let coupon = self
            .coupons
            .find_coupon_by_code(code)
            .await
            .map_err(store_error)?
            .ok_or(DiscountError::InvalidOrExpiredCode)?;

        let granted = evaluate_coupon(&coupon, order_value, now)?;
        info!(
            code = %code,
            coupon_id = %granted.coupon_id,
            discount = %granted.discount,
            "Coupon applied"
        );
        Ok(DiscountOutcome::Coupon(granted))
    }
}

fn store_error(err: StoreError) -> DiscountError {
    if err.is_unavailable() {
        error!(error = %err, "Discount store unavailable");
        DiscountError::StoreUnavailable(err.to_string())
    } else {
        error!(error = %err, "Discount store failed");
        DiscountError::StoreFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        diwali20, seeded_db, welcome10, FailingStores, FakeDiscountStores,
    };
    use chrono::Duration;
    use sweets_core::{CouponKind, DiscountSource, PromotionUsage};

    #[tokio::test]
    async fn test_empty_code_is_required() {
        let stores = FakeDiscountStores::default();
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("", Money::from_rupees(100), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, DiscountError::CodeRequired);
        assert_eq!(err.to_string(), "Coupon code is required");
    }

    #[tokio::test]
    async fn test_negative_order_value_rejected() {
        let stores = FakeDiscountStores::default();
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("WELCOME10", Money::from_paise(-100), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscountError::InvalidOrderValue(_)));
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let stores = FakeDiscountStores::default();
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("NOPE", Money::from_rupees(100), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired coupon code");
    }

    #[tokio::test]
    async fn test_live_promotion_wins_over_coupon_with_same_code() {
        let now = Utc::now();
        let mut promo = diwali20();
        promo.coupon_code = Some("SHARED".to_string());
        let mut coupon = welcome10();
        coupon.code = "SHARED".to_string();

        let stores = FakeDiscountStores::default()
            .with_promotion(promo.clone(), 0)
            .with_coupon(coupon);
        let resolver = DiscountResolver::new(&stores, &stores);

        let outcome = resolver
            .resolve("SHARED", Money::from_rupees(1000), now)
            .await
            .unwrap();

        match outcome {
            DiscountOutcome::Promotion(p) => {
                assert_eq!(p.promotion_id, promo.id);
                assert_eq!(p.discount, Money::from_rupees(200));
            }
            other => panic!("expected promotion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_promotion_falls_through_to_coupon() {
        let now = Utc::now();
        let mut promo = diwali20();
        promo.coupon_code = Some("SHARED".to_string());
        promo.end_at = now - Duration::hours(1);
        let mut coupon = welcome10();
        coupon.code = "SHARED".to_string();

        let stores = FakeDiscountStores::default()
            .with_promotion(promo, 0)
            .with_coupon(coupon.clone());
        let resolver = DiscountResolver::new(&stores, &stores);

        let outcome = resolver
            .resolve("SHARED", Money::from_rupees(3000), now)
            .await
            .unwrap();

        assert_eq!(outcome.source(), DiscountSource::Coupon);
        assert_eq!(outcome.discount(), Money::from_rupees(200));
    }

    #[tokio::test]
    async fn test_exhausted_promotion_does_not_fall_through() {
        let mut promo = diwali20();
        promo.coupon_code = Some("SHARED".to_string());
        promo.max_uses = Some(5);
        let mut coupon = welcome10();
        coupon.code = "SHARED".to_string();

        let stores = FakeDiscountStores::default()
            .with_promotion(promo, 5)
            .with_coupon(coupon);
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("SHARED", Money::from_rupees(3000), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DiscountError::UsageLimitExceeded {
                origin: DiscountSource::Promotion
            }
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let stores = FailingStores::unreachable();
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("WELCOME10", Money::from_rupees(3000), Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_persistent_store_error_is_not_retryable() {
        let stores = FailingStores::broken();
        let resolver = DiscountResolver::new(&stores, &stores);

        let err = resolver
            .resolve("WELCOME10", Money::from_rupees(3000), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscountError::StoreFailed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_welcome10_against_database() {
        let db = seeded_db().await;
        let resolver = DiscountResolver::new(&db, &db);
        let now = Utc::now();

        let outcome = resolver
            .resolve("WELCOME10", Money::from_rupees(3000), now)
            .await
            .unwrap();
        match &outcome {
            DiscountOutcome::Coupon(c) => {
                assert_eq!(c.kind, CouponKind::Percentage);
                assert_eq!(c.discount, Money::from_rupees(200));
            }
            other => panic!("expected coupon, got {:?}", other),
        }

        let err = resolver
            .resolve("WELCOME10", Money::from_rupees(400), now)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DiscountError::MinimumOrderNotMet {
                minimum: Money::from_rupees(500)
            }
        );
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_and_read_only() {
        let db = seeded_db().await;
        let resolver = DiscountResolver::new(&db, &db);
        let now = Utc::now();

        let first = resolver
            .resolve("DIWALI20", Money::from_rupees(1000), now)
            .await
            .unwrap();
        let second = resolver
            .resolve("DIWALI20", Money::from_rupees(1000), now)
            .await
            .unwrap();
        assert_eq!(first, second);

        let third = resolver
            .resolve("WELCOME10", Money::from_rupees(3000), now)
            .await
            .unwrap();
        let fourth = resolver
            .resolve("WELCOME10", Money::from_rupees(3000), now)
            .await
            .unwrap();
        assert_eq!(third, fourth);

        let coupon = db.coupons().get_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 0);
        let promo = db
            .promotions()
            .find_by_coupon_code("DIWALI20")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(db.promotions().count_usages(&promo.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recorded_usages_count_toward_limit() {
        let db = seeded_db().await;
        let promo = db
            .promotions()
            .find_by_coupon_code("DIWALI20")
            .await
            .unwrap()
            .unwrap();

        let mut capped = promo.clone();
        capped.max_uses = Some(1);
        db.promotions().update(&capped).await.unwrap();

        let resolver = DiscountResolver::new(&db, &db);
        let before = resolver
            .resolve("DIWALI20", Money::from_rupees(1000), Utc::now())
            .await
            .unwrap();
        match before {
            DiscountOutcome::Promotion(p) => assert_eq!(p.uses_left, Some(1)),
            other => panic!("expected promotion, got {:?}", other),
        }

        db.promotions()
            .record_usage(&PromotionUsage::new(&promo.id, Some("user-1".into()), None))
            .await
            .unwrap();

        let err = resolver
            .resolve("DIWALI20", Money::from_rupees(1000), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Promotion usage limit exceeded");
    }
}
