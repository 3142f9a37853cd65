//! # Cart Repository
//!
//! Server-side cart lines for signed-in users.
//!
//! ## Atomic Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two tabs add the same sweet at the same time                           │
//! │                                                                         │
//! │  Tab A: add 3 ──┐                                                       │
//! │                 ├──► INSERT … ON CONFLICT(user_id, product_id)          │
//! │  Tab B: add 2 ──┘        DO UPDATE SET quantity = quantity + n          │
//! │                          WHERE quantity + n <= ceiling                  │
//! │                                                                         │
//! │  Both land as one statement each: the line ends at 5, never 3 or 2,     │
//! │  and never above the ceiling.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use sweets_core::{new_id, CartLine};

#[derive(Debug, FromRow)]
struct CartItemRow {
    product_id: String,
    quantity: i64,
    name: String,
    unit_price_paise: i64,
    images: Json<Vec<String>>,
    slug: String,
    added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartLine {
    fn from(row: CartItemRow) -> Self {
        CartLine {
            product_id: row.product_id,
            quantity: row.quantity,
            name: row.name,
            unit_price_paise: row.unit_price_paise,
            images: row.images.0,
            slug: row.slug,
            added_at: row.added_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// All lines of a user, oldest first.
    pub async fn lines(&self, user_id: &str) -> DbResult<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT product_id, quantity, name, unit_price_paise, images, slug, added_at
            FROM cart_items
            WHERE user_id = ?1
            ORDER BY added_at, rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    pub async fn find_line(&self, user_id: &str, product_id: &str) -> DbResult<Option<CartLine>> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT product_id, quantity, name, unit_price_paise, images, slug, added_at
            FROM cart_items
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    /// Inserts `line` or adds its quantity to the existing line, in one
    /// statement.
    ///
    /// ## Returns
    /// * `Some(quantity)` - the line's quantity after the write
    /// * `None` - the result would exceed `ceiling`; nothing was written
    pub async fn increment(
        &self,
        user_id: &str,
        line: &CartLine,
        ceiling: i64,
    ) -> DbResult<Option<i64>> {
        debug!(
            user_id = %user_id,
            product_id = %line.product_id,
            quantity = line.quantity,
            ceiling,
            "Incrementing cart line"
        );

        // The SELECT form needs a WHERE clause for SQLite to parse the upsert.
        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO cart_items (
                id, user_id, product_id, quantity, name, unit_price_paise, images, slug, added_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
            WHERE ?4 <= ?10
            ON CONFLICT (user_id, product_id) DO UPDATE
                SET quantity = cart_items.quantity + excluded.quantity
                WHERE cart_items.quantity + excluded.quantity <= ?10
            RETURNING quantity
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(&line.name)
        .bind(line.unit_price_paise)
        .bind(Json(&line.images))
        .bind(&line.slug)
        .bind(line.added_at)
        .bind(ceiling)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity)
    }

    /// Overwrites the quantity of an existing line. Returns whether a line
    /// was updated.
    pub async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<bool> {
        debug!(user_id = %user_id, product_id = %product_id, quantity, "Setting cart line quantity");

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?3 WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes one line. Returns whether a line existed.
    pub async fn delete_line(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every line of a user and returns how many were removed.
    pub async fn delete_all(&self, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %user_id, removed = result.rows_affected(), "Cleared cart");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{gulab_jamun, test_db};
    use crate::DbError;

    #[tokio::test]
    async fn test_increment_inserts_then_adds() {
        let db = test_db().await;
        let product = db.products().insert(&gulab_jamun()).await.unwrap();
        let repo = db.cart_items();

        let first = repo
            .increment("user-1", &CartLine::from_product(&product, 3), 50)
            .await
            .unwrap();
        let second = repo
            .increment("user-1", &CartLine::from_product(&product, 2), 50)
            .await
            .unwrap();

        assert_eq!(first, Some(3));
        assert_eq!(second, Some(5));

        let lines = repo.lines("user-1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].slug, "gulab-jamun");
        assert_eq!(lines[0].images, product.images);
    }

    #[tokio::test]
    async fn test_increment_refuses_to_pass_ceiling() {
        let db = test_db().await;
        let product = db.products().insert(&gulab_jamun()).await.unwrap();
        let repo = db.cart_items();

        // New line above the ceiling
        let rejected = repo
            .increment("user-1", &CartLine::from_product(&product, 60), 50)
            .await
            .unwrap();
        assert_eq!(rejected, None);
        assert!(repo.lines("user-1").await.unwrap().is_empty());

        // Existing line pushed above the ceiling
        repo.increment("user-1", &CartLine::from_product(&product, 45), 50)
            .await
            .unwrap();
        let rejected = repo
            .increment("user-1", &CartLine::from_product(&product, 10), 50)
            .await
            .unwrap();
        assert_eq!(rejected, None);
        let line = repo.find_line("user-1", &product.id).await.unwrap().unwrap();
        assert_eq!(line.quantity, 45);
    }

    #[tokio::test]
    async fn test_lines_are_scoped_per_user() {
        let db = test_db().await;
        let product = db.products().insert(&gulab_jamun()).await.unwrap();
        let repo = db.cart_items();

        repo.increment("user-1", &CartLine::from_product(&product, 1), 50)
            .await
            .unwrap();
        repo.increment("user-2", &CartLine::from_product(&product, 4), 50)
            .await
            .unwrap();

        assert_eq!(repo.lines("user-1").await.unwrap()[0].quantity, 1);
        assert_eq!(repo.lines("user-2").await.unwrap()[0].quantity, 4);

        assert_eq!(repo.delete_all("user-1").await.unwrap(), 1);
        assert!(repo.lines("user-1").await.unwrap().is_empty());
        assert_eq!(repo.lines("user-2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_and_delete_line() {
        let db = test_db().await;
        let product = db.products().insert(&gulab_jamun()).await.unwrap();
        let repo = db.cart_items();

        assert!(!repo.set_quantity("user-1", &product.id, 3).await.unwrap());

        repo.increment("user-1", &CartLine::from_product(&product, 1), 50)
            .await
            .unwrap();
        assert!(repo.set_quantity("user-1", &product.id, 7).await.unwrap());
        assert_eq!(
            repo.find_line("user-1", &product.id).await.unwrap().unwrap().quantity,
            7
        );

        assert!(repo.delete_line("user-1", &product.id).await.unwrap());
        assert!(!repo.delete_line("user-1", &product.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_quantity_violates_check() {
        let db = test_db().await;
        let product = db.products().insert(&gulab_jamun()).await.unwrap();
        let repo = db.cart_items();
        repo.increment("user-1", &CartLine::from_product(&product, 1), 50)
            .await
            .unwrap();

        let err = repo.set_quantity("user-1", &product.id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
