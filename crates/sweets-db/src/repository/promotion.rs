//! # Promotion Repository
//!
//! Campaign administration, code lookup, and redemption bookkeeping.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  promotions ─┬─< promotion_products   (scope: specific products)        │
//! │              ├─< promotion_categories (scope: whole categories)         │
//! │              └─< promotion_usages     (one row per redemption)          │
//! │                                                                         │
//! │  Checkout reads:   find_by_coupon_code() + count_usages()               │
//! │  Order placement:  record_usage()                                       │
//! │  Admin console:    insert / update / set_active / delete / list         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Link rows are written in the same transaction as the promotion row.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use sweets_core::{Promotion, PromotionKind, PromotionUsage};

#[derive(Debug, FromRow)]
struct PromotionRow {
    id: String,
    name: String,
    kind: PromotionKind,
    value: i64,
    min_order_paise: Option<i64>,
    coupon_code: Option<String>,
    max_uses: Option<i64>,
    user_limit: Option<i64>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    combinable: bool,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromotionRow {
    fn into_promotion(self, product_ids: Vec<String>, category_ids: Vec<String>) -> Promotion {
        Promotion {
            id: self.id,
            name: self.name,
            kind: self.kind,
            value: self.value,
            min_order_paise: self.min_order_paise,
            coupon_code: self.coupon_code,
            max_uses: self.max_uses,
            user_limit: self.user_limit,
            start_at: self.start_at,
            end_at: self.end_at,
            combinable: self.combinable,
            active: self.active,
            product_ids,
            category_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for promotions and their usage records.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(
            r#"
            SELECT
                id, name, kind, value, min_order_paise, coupon_code, max_uses,
                user_limit, start_at, end_at, combinable, active, created_at, updated_at
            FROM promotions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Finds the promotion carrying `code`, regardless of whether it is live.
    ///
    /// Matching is exact and case-sensitive.
    pub async fn find_by_coupon_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        debug!(code = %code, "Looking up promotion by coupon code");

        let row = sqlx::query_as::<_, PromotionRow>(
            r#"
            SELECT
                id, name, kind, value, min_order_paise, coupon_code, max_uses,
                user_limit, start_at, end_at, combinable, active, created_at, updated_at
            FROM promotions
            WHERE coupon_code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists all promotions, newest first.
    pub async fn list(&self) -> DbResult<Vec<Promotion>> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            r#"
            SELECT
                id, name, kind, value, min_order_paise, coupon_code, max_uses,
                user_limit, start_at, end_at, combinable, active, created_at, updated_at
            FROM promotions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut promotions = Vec::with_capacity(rows.len());
        for row in rows {
            promotions.push(self.hydrate(row).await?);
        }
        Ok(promotions)
    }

    async fn hydrate(&self, row: PromotionRow) -> DbResult<Promotion> {
        let product_ids: Vec<String> = sqlx::query_scalar(
            "SELECT product_id FROM promotion_products WHERE promotion_id = ?1 ORDER BY product_id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let category_ids: Vec<String> = sqlx::query_scalar(
            "SELECT category_id FROM promotion_categories WHERE promotion_id = ?1 ORDER BY category_id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(row.into_promotion(product_ids, category_ids))
    }

    // =========================================================================
    // Admin writes
    // =========================================================================

    /// Inserts a promotion together with its product and category links.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - coupon code already used by a promotion
    /// * `DbError::ForeignKeyViolation` - linked product/category missing
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<Promotion> {
        debug!(name = %promotion.name, code = ?promotion.coupon_code, "Inserting promotion");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, name, kind, value, min_order_paise, coupon_code, max_uses,
                user_limit, start_at, end_at, combinable, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.kind)
        .bind(promotion.value)
        .bind(promotion.min_order_paise)
        .bind(&promotion.coupon_code)
        .bind(promotion.max_uses)
        .bind(promotion.user_limit)
        .bind(promotion.start_at)
        .bind(promotion.end_at)
        .bind(promotion.combinable)
        .bind(promotion.active)
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .execute(&mut *tx)
        .await?;

        write_links(&mut tx, promotion).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %promotion.id, "Promotion created");
        Ok(promotion.clone())
    }

    /// Replaces every editable field and both link sets.
    pub async fn update(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, "Updating promotion");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                name = ?2,
                kind = ?3,
                value = ?4,
                min_order_paise = ?5,
                coupon_code = ?6,
                max_uses = ?7,
                user_limit = ?8,
                start_at = ?9,
                end_at = ?10,
                combinable = ?11,
                active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.kind)
        .bind(promotion.value)
        .bind(promotion.min_order_paise)
        .bind(&promotion.coupon_code)
        .bind(promotion.max_uses)
        .bind(promotion.user_limit)
        .bind(promotion.start_at)
        .bind(promotion.end_at)
        .bind(promotion.combinable)
        .bind(promotion.active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", &promotion.id));
        }

        sqlx::query("DELETE FROM promotion_products WHERE promotion_id = ?1")
            .bind(&promotion.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM promotion_categories WHERE promotion_id = ?1")
            .bind(&promotion.id)
            .execute(&mut *tx)
            .await?;

        write_links(&mut tx, promotion).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Toggles a promotion on or off without touching anything else.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting promotion active flag");

        let result = sqlx::query("UPDATE promotions SET active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    /// Deletes a promotion. Links and usage records cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deleting promotion");

        let result = sqlx::query("DELETE FROM promotions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    // =========================================================================
    // Usage
    // =========================================================================

    /// Number of recorded redemptions of a promotion.
    pub async fn count_usages(&self, promotion_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM promotion_usages WHERE promotion_id = ?1")
                .bind(promotion_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Records one redemption. Called when an order is placed.
    pub async fn record_usage(&self, usage: &PromotionUsage) -> DbResult<()> {
        debug!(
            promotion_id = %usage.promotion_id,
            user_id = ?usage.user_id,
            order_id = ?usage.order_id,
            "Recording promotion usage"
        );

        sqlx::query(
            r#"
            INSERT INTO promotion_usages (id, promotion_id, user_id, order_id, used_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&usage.id)
        .bind(&usage.promotion_id)
        .bind(&usage.user_id)
        .bind(&usage.order_id)
        .bind(usage.used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn write_links(tx: &mut Transaction<'_, Sqlite>, promotion: &Promotion) -> DbResult<()> {
    for product_id in &promotion.product_ids {
        sqlx::query("INSERT INTO promotion_products (promotion_id, product_id) VALUES (?1, ?2)")
            .bind(&promotion.id)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }

    for category_id in &promotion.category_ids {
        sqlx::query("INSERT INTO promotion_categories (promotion_id, category_id) VALUES (?1, ?2)")
            .bind(&promotion.id)
            .bind(category_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
