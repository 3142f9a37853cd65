//! # Local Cart Store
//!
//! Guest carts held in process memory, keyed by anonymous session id.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Mutex<HashMap<session_id, Cart>>                                       │
//! │                                                                         │
//! │  add / set / remove / clear ──► lock ──► mutate Cart ──► unlock         │
//! │                                                                         │
//! │  The lock is never held across an .await.                               │
//! │  A poisoned lock surfaces as StoreError::Poisoned.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are the same JSON the browser keeps in local storage, so a
//! session's cart can be handed over or restored as one string.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use sweets_core::{Cart, CartLine};

use super::{CartStore, LineWrite, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct LocalCartStore {
    carts: Mutex<HashMap<String, Cart>>,
}

impl LocalCartStore {
    pub fn new() -> Self {
        LocalCartStore::default()
    }

    fn carts(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Cart>>> {
        self.carts.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Serializes a session's cart. An unknown session yields an empty cart.
    pub fn export_snapshot(&self, owner: &str) -> StoreResult<String> {
        let carts = self.carts()?;
        let json = match carts.get(owner) {
            Some(cart) => serde_json::to_string(cart)?,
            None => serde_json::to_string(&Cart::new())?,
        };
        Ok(json)
    }

    /// Replaces a session's cart with a previously exported snapshot.
    pub fn restore_snapshot(&self, owner: &str, snapshot: &str) -> StoreResult<()> {
        let cart: Cart = serde_json::from_str(snapshot)?;
        debug!(owner = %owner, lines = cart.lines().len(), "Restoring guest cart snapshot");
        self.carts()?.insert(owner.to_string(), cart);
        Ok(())
    }

    /// Number of sessions currently holding a cart.
    pub fn session_count(&self) -> StoreResult<usize> {
        Ok(self.carts()?.len())
    }
}

#[async_trait]
impl CartStore for LocalCartStore {
    async fn lines(&self, owner: &str) -> StoreResult<Vec<CartLine>> {
        Ok(self
            .carts()?
            .get(owner)
            .map(|cart| cart.lines().to_vec())
            .unwrap_or_default())
    }

    async fn find_line(&self, owner: &str, product_id: &str) -> StoreResult<Option<CartLine>> {
        Ok(self
            .carts()?
            .get(owner)
            .and_then(|cart| cart.find(product_id).cloned()))
    }

    async fn increment_line(
        &self,
        owner: &str,
        line: CartLine,
        ceiling: i64,
    ) -> StoreResult<LineWrite> {
        let mut carts = self.carts()?;
        if let Some(cart) = carts.get_mut(owner) {
            return Ok(written(cart.increment(line, ceiling)));
        }

        // New sessions are only recorded once a line actually lands.
        let mut cart = Cart::new();
        let write = written(cart.increment(line, ceiling));
        if let LineWrite::Applied(_) = write {
            carts.insert(owner.to_string(), cart);
        }
        Ok(write)
    }

    async fn replace_quantity(
        &self,
        owner: &str,
        product_id: &str,
        quantity: i64,
    ) -> StoreResult<bool> {
        Ok(self
            .carts()?
            .get_mut(owner)
            .map(|cart| cart.replace_quantity(product_id, quantity))
            .unwrap_or(false))
    }

    async fn delete_line(&self, owner: &str, product_id: &str) -> StoreResult<bool> {
        let mut carts = self.carts()?;
        let Some(cart) = carts.get_mut(owner) else {
            return Ok(false);
        };
        let removed = cart.remove(product_id);
        if cart.is_empty() {
            carts.remove(owner);
        }
        Ok(removed)
    }

    async fn delete_all(&self, owner: &str) -> StoreResult<()> {
        self.carts()?.remove(owner);
        Ok(())
    }
}

fn written(quantity: Option<i64>) -> LineWrite {
    match quantity {
        Some(quantity) => LineWrite::Applied(quantity),
        None => LineWrite::Rejected,
    }
}
