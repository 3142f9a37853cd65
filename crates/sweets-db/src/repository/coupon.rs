//! # Coupon Repository
//!
//! Standalone coupon codes. Checkout only reads them; `used_count` moves
//! when an order is placed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use sweets_core::{Coupon, CouponKind};

#[derive(Debug, FromRow)]
struct CouponRow {
    id: String,
    code: String,
    kind: CouponKind,
    value: i64,
    min_order_value_paise: Option<i64>,
    max_discount_paise: Option<i64>,
    usage_limit: Option<i64>,
    used_count: i64,
    is_active: bool,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Coupon {
            id: row.id,
            code: row.code,
            kind: row.kind,
            value: row.value,
            min_order_value_paise: row.min_order_value_paise,
            max_discount_paise: row.max_discount_paise,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            is_active: row.is_active,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Exact, case-sensitive code lookup. Liveness is not checked here.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        debug!(code = %code, "Looking up coupon");

        let row = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT
                id, code, kind, value, min_order_value_paise, max_discount_paise,
                usage_limit, used_count, is_active, valid_from, valid_until,
                created_at, updated_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }

    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT
                id, code, kind, value, min_order_value_paise, max_discount_paise,
                usage_limit, used_count, is_active, valid_from, valid_until,
                created_at, updated_at
            FROM coupons
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Coupon::from).collect())
    }

    /// Inserts a coupon.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - code already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<Coupon> {
        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, kind, value, min_order_value_paise, max_discount_paise,
                usage_limit, used_count, is_active, valid_from, valid_until,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.kind)
        .bind(coupon.value)
        .bind(coupon.min_order_value_paise)
        .bind(coupon.max_discount_paise)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.is_active)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(coupon.clone())
    }

    /// Counts one redemption and returns the new `used_count`.
    pub async fn increment_used_count(&self, id: &str) -> DbResult<i64> {
        debug!(id = %id, "Incrementing coupon used_count");

        let used: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE coupons
            SET used_count = used_count + 1, updated_at = ?2
            WHERE id = ?1
            RETURNING used_count
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        used.ok_or_else(|| DbError::not_found("Coupon", id))
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{test_db, welcome10};

    #[tokio::test]
    async fn test_insert_and_get_by_code() {
        let db = test_db().await;
        let coupon = db.coupons().insert(&welcome10()).await.unwrap();

        let found = db.coupons().get_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(found.id, coupon.id);
        assert_eq!(found.kind, CouponKind::Percentage);
        assert_eq!(found.max_discount_paise, Some(20_000));
        assert!(db.coupons().get_by_code("welcome10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        db.coupons().insert(&welcome10()).await.unwrap();

        let mut dup = welcome10();
        dup.id = sweets_core::new_id();
        assert!(matches!(
            db.coupons().insert(&dup).await.unwrap_err(),
            DbError::UniqueViolation { .. }
        ));
    }

    #[tokio::test]
    async fn test_increment_used_count() {
        let db = test_db().await;
        let coupon = db.coupons().insert(&welcome10()).await.unwrap();

        assert_eq!(db.coupons().increment_used_count(&coupon.id).await.unwrap(), 1);
        assert_eq!(db.coupons().increment_used_count(&coupon.id).await.unwrap(), 2);
        assert!(matches!(
            db.coupons().increment_used_count("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = test_db().await;
        let coupon = db.coupons().insert(&welcome10()).await.unwrap();

        db.coupons().set_active(&coupon.id, false).await.unwrap();
        let stored = db.coupons().get_by_code("WELCOME10").await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(db.coupons().list().await.unwrap().len(), 1);
    }
}
