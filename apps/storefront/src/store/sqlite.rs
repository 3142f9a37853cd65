//! Catalog and discount lookups backed by the SQLite repositories.

use async_trait::async_trait;

use sweets_core::{Coupon, Product, Promotion};
use sweets_db::Database;

use super::{CouponStore, ProductCatalog, PromotionStore, StoreResult};

#[async_trait]
impl ProductCatalog for Database {
    async fn find_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products().get_by_id(product_id).await?)
    }
}

#[async_trait]
impl PromotionStore for Database {
    async fn find_promotion_by_code(&self, code: &str) -> StoreResult<Option<Promotion>> {
        Ok(self.promotions().find_by_coupon_code(code).await?)
    }

    async fn count_usages(&self, promotion_id: &str) -> StoreResult<i64> {
        Ok(self.promotions().count_usages(promotion_id).await?)
    }
}

#[async_trait]
impl CouponStore for Database {
    async fn find_coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        Ok(self.coupons().get_by_code(code).await?)
    }
}
