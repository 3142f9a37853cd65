//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Storefront service                                                     │
//! │       │                                                                 │
//! │       │  db.coupons().get_by_code("WELCOME10")                          │
//! │       ▼                                                                 │
//! │  CouponRepository                                                       │
//! │  ├── get_by_code(&self, code)                                           │
//! │  ├── insert(&self, coupon)                                              │
//! │  └── increment_used_count(&self, id)                                    │
//! │       │                                                                 │
//! │       │  SQL Query → Row struct → sweets-core type                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog lookups and inventory
//! - [`CategoryRepository`](category::CategoryRepository) - Promotion scoping
//! - [`PromotionRepository`](promotion::PromotionRepository) - Campaigns and usage records
//! - [`CouponRepository`](coupon::CouponRepository) - Standalone coupons
//! - [`CartRepository`](cart::CartRepository) - Signed-in users' cart lines

pub mod cart;
pub mod category;
pub mod coupon;
pub mod product;
pub mod promotion;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use sweets_core::{new_id, Category, Coupon, CouponKind, Product, Promotion, PromotionKind};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn gulab_jamun() -> Product {
        let now = Utc::now();
        Product {
            id: new_id(),
            sku: "GJ001".to_string(),
            name: "Gulab Jamun".to_string(),
            slug: "gulab-jamun".to_string(),
            description: Some("Soft milk dumplings soaked in rose syrup".to_string()),
            price_paise: 28_000,
            images: vec![
                "/images/products/gulab-jamun-1.svg".to_string(),
                "/images/products/gulab-jamun-2.svg".to_string(),
            ],
            category_id: None,
            inventory_qty: 50,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sweets_category() -> Category {
        Category {
            id: new_id(),
            name: "Sweets".to_string(),
            slug: "sweets".to_string(),
            is_active: true,
        }
    }

    pub fn diwali20() -> Promotion {
        let now = Utc::now();
        Promotion {
            id: new_id(),
            name: "Diwali Sitewide Sale".to_string(),
            kind: PromotionKind::Percentage,
            value: 2000,
            min_order_paise: Some(29_900),
            coupon_code: Some("DIWALI20".to_string()),
            max_uses: Some(1000),
            user_limit: Some(1),
            start_at: now - Duration::days(1),
            end_at: now + Duration::days(10),
            combinable: false,
            active: true,
            product_ids: Vec::new(),
            category_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn welcome10() -> Coupon {
        let now = Utc::now();
        Coupon {
            id: new_id(),
            code: "WELCOME10".to_string(),
            kind: CouponKind::Percentage,
            value: 1000,
            min_order_value_paise: Some(50_000),
            max_discount_paise: Some(20_000),
            usage_limit: Some(100),
            used_count: 0,
            is_active: true,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(365),
            created_at: now,
            updated_at: now,
        }
    }
}
