//! # Server Cart Store
//!
//! Cart lines for signed-in users, kept in the `cart_items` table and keyed
//! by user id. Increments are single upsert statements, so concurrent adds
//! for the same product sum instead of overwriting each other.

use async_trait::async_trait;

use sweets_core::CartLine;
use sweets_db::Database;

use super::{CartStore, LineWrite, StoreResult};

#[derive(Debug, Clone)]
pub struct ServerCartStore {
    db: Database,
}

impl ServerCartStore {
    pub fn new(db: Database) -> Self {
        ServerCartStore { db }
    }
}

#[async_trait]
impl CartStore for ServerCartStore {
    async fn lines(&self, owner: &str) -> StoreResult<Vec<CartLine>> {
        Ok(self.db.cart_items().lines(owner).await?)
    }

    async fn find_line(&self, owner: &str, product_id: &str) -> StoreResult<Option<CartLine>> {
        Ok(self.db.cart_items().find_line(owner, product_id).await?)
    }

    async fn increment_line(
        &self,
        owner: &str,
        line: CartLine,
        ceiling: i64,
    ) -> StoreResult<LineWrite> {
        let written = self.db.cart_items().increment(owner, &line, ceiling).await?;
        Ok(match written {
            Some(quantity) => LineWrite::Applied(quantity),
            None => LineWrite::Rejected,
        })
    }

    async fn replace_quantity(
        &self,
        owner: &str,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<bool> {
        Ok(self
            .db
            .cart_items()
            .set_quantity(owner, product_id, quantity)
            .await?)
    }

    async fn delete_line(&self, owner: &str, product_id: &str) -> StoreResult<bool> {
        Ok(self.db.cart_items().delete_line(owner, product_id).await?)
    }

    async fn delete_all(&self, owner: &str) -> StoreResult<()> {
        self.db.cart_items().delete_all(owner).await?;
        Ok(())
    }
}
