//! # Cart Reconciler
//!
//! One cart API over two stores. Signed-in users write to the server store,
//! guests to the local store; callers never branch on which.
//!
//! ## Add Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add("p-gj001", 2)                                                      │
//! │       │                                                                 │
//! │       ├── qty <= 0 ─────────────────────────────► InvalidQuantity       │
//! │       ▼                                                                 │
//! │  ProductCatalog::find_product + CartStore::find_line                    │
//! │       │                                                                 │
//! │       ├── missing / inactive ───────────────────► ProductNotFound       │
//! │       ├── existing + qty > inventory ───────────► InsufficientInventory │
//! │       ▼                                                                 │
//! │  CartStore::increment_line(line, ceiling = inventory)                   │
//! │       │                                                                 │
//! │       ├── Rejected (raced past stock) ──────────► InsufficientInventory │
//! │       ▼                                                                 │
//! │  CartView { lines, totals }                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pre-check produces the shopper-facing error. The ceiling on the
//! store write is what actually holds under concurrent adds.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use sweets_core::cart::{check_add, check_set_quantity};
use sweets_core::{CartError, CartLine, CartView};

use crate::store::{CartStore, LineWrite, ProductCatalog, StoreError};

// =============================================================================
// Reconciler
// =============================================================================

/// Cart operations for a single owner (user id or guest session id).
pub struct CartReconciler<'a> {
    catalog: &'a dyn ProductCatalog,
    store: &'a dyn CartStore,
    owner: String,
}

impl<'a> CartReconciler<'a> {
    pub fn new(
        catalog: &'a dyn ProductCatalog,
        store: &'a dyn CartStore,
        owner: impl Into<String>,
    ) -> Self {
        CartReconciler {
            catalog,
            store,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Adds `quantity` units, merging into an existing line.
    pub async fn add(&self, product_id: &str, quantity: i64) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = self
            .catalog
            .find_product(product_id)
            .await
            .map_err(store_error)?;
        let existing = self
            .store
            .find_line(&self.owner, product_id)
            .await
            .map_err(store_error)?
            .map(|line| line.quantity)
            .unwrap_or(0);

        let (product, requested) = check_add(product_id, product.as_ref(), existing, quantity)?;

        let line = CartLine::from_product(product, quantity);
        let written = self
            .store
            .increment_line(&self.owner, line, product.inventory_qty)
            .await
            .map_err(store_error)?;

        match written {
            LineWrite::Applied(new_quantity) => {
                debug!(
                    owner = %self.owner,
                    product_id = %product_id,
                    quantity = new_quantity,
                    "Cart line incremented"
                );
            }
            LineWrite::Rejected => {
                let current = self
                    .store
                    .find_line(&self.owner, product_id)
                    .await
                    .map_err(store_error)?
                    .map(|line| line.quantity)
                    .unwrap_or(0);
                warn!(
                    owner = %self.owner,
                    product_id = %product_id,
                    expected = requested,
                    "Concurrent add exceeded inventory"
                );
                return Err(CartError::InsufficientInventory {
                    product_id: product_id.to_string(),
                    available: product.inventory_qty,
                    requested: current.saturating_add(quantity),
                });
            }
        }

        self.view().await
    }

    /// Sets a line's quantity outright. `quantity <= 0` removes the line.
    pub async fn set_quantity(&self, product_id: &str, quantity: i64) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return self.remove(product_id).await;
        }

        let exists = self
            .store
            .find_line(&self.owner, product_id)
            .await
            .map_err(store_error)?
            .is_some();
        if !exists {
            return Err(CartError::LineNotFound(product_id.to_string()));
        }

        let product = self
            .catalog
            .find_product(product_id)
            .await
            .map_err(store_error)?;
        check_set_quantity(product_id, product.as_ref(), quantity)?;

        let replaced = self
            .store
            .replace_quantity(&self.owner, product_id, quantity)
            .await
            .map_err(store_error)?;
        if !replaced {
            return Err(CartError::LineNotFound(product_id.to_string()));
        }

        debug!(owner = %self.owner, product_id = %product_id, quantity, "Cart line set");
        self.view().await
    }

    /// Drops a line. Removing a product that isn't in the cart is a no-op.
    pub async fn remove(&self, product_id: &str) -> Result<CartView, CartError> {
        let removed = self
            .store
            .delete_line(&self.owner, product_id)
            .await
            .map_err(store_error)?;
        debug!(owner = %self.owner, product_id = %product_id, removed, "Cart line removed");
        self.view().await
    }

    pub async fn clear(&self) -> Result<CartView, CartError> {
        self.store
            .delete_all(&self.owner)
            .await
            .map_err(store_error)?;
        debug!(owner = %self.owner, "Cart cleared");
        self.view().await
    }

    pub async fn view(&self) -> Result<CartView, CartError> {
        let lines = self.store.lines(&self.owner).await.map_err(store_error)?;
        Ok(CartView::new(lines))
    }
}

fn store_error(err: StoreError) -> CartError {
    if err.is_unavailable() {
        error!(error = %err, "Cart store unavailable");
        CartError::StoreUnavailable(err.to_string())
    } else {
        error!(error = %err, "Cart store failed");
        CartError::StoreFailed(err.to_string())
    }
}

// =============================================================================
// Guest → User Merge
// =============================================================================

/// A guest line that could not be carried into the user's cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    pub product_id: String,
    pub quantity: i64,
    pub reason: String,
}

/// Result of [`merge_guest_cart`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub cart: CartView,
    pub merged: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Replays every guest line as an `add` on the user's cart, then empties
/// the guest cart.
///
/// Lines that fail validation (out of stock, delisted) are skipped and
/// reported. Each merged line leaves the guest cart as soon as it lands in
/// the user's cart, so when a store fails the merge stops and a
/// retry replays only the lines still pending.
pub async fn merge_guest_cart(
    guest: &CartReconciler<'_>,
    user: &CartReconciler<'_>,
) -> Result<MergeReport, CartError> {
    let guest_view = guest.view().await?;
    let mut merged = 0;
    let mut skipped = Vec::new();

    for line in &guest_view.lines {
        match user.add(&line.product_id, line.quantity).await {
            Ok(_) => {
                guest.remove(&line.product_id).await?;
                merged += 1;
            }
            Err(err @ (CartError::StoreUnavailable(_) | CartError::StoreFailed(_))) => {
                return Err(err);
            }
            Err(err) => {
                warn!(
                    guest = %guest.owner(),
                    user = %user.owner(),
                    product_id = %line.product_id,
                    error = %err,
                    "Skipping guest cart line"
                );
                skipped.push(SkippedLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    reason: err.to_string(),
                });
            }
        }
    }

    guest.clear().await?;
    let cart = user.view().await?;

    info!(
        guest = %guest.owner(),
        user = %user.owner(),
        merged,
        skipped = skipped.len(),
        "Guest cart merged"
    );

    Ok(MergeReport {
        cart,
        merged,
        skipped,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalCartStore, ServerCartStore, StoreResult};
    use crate::test_support::{gulab_jamun, seeded_db, FailingStores, GJ001_ID, KAJU_KATLI_ID};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sweets_core::{Money, Product};
    use sweets_db::{Database, DbError};

    /// Catalog that always answers with one fixed listing.
    struct FixedCatalog(Product);

    #[async_trait]
    impl ProductCatalog for FixedCatalog {
        async fn find_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
            Ok(Some(self.0.clone()).filter(|p| p.id == product_id))
        }
    }

    /// Delegates to `inner`, but the `fail_on`-th increment reports a dropped connection.
    struct FlakyCartStore<S> {
        inner: S,
        increments: AtomicUsize,
        fail_on: usize,
    }

    impl<S> FlakyCartStore<S> {
        fn failing_on(inner: S, fail_on: usize) -> Self {
            FlakyCartStore {
                inner,
                increments: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl<S: CartStore> CartStore for FlakyCartStore<S> {
        async fn lines(&self, owner: &str) -> StoreResult<Vec<CartLine>> {
            self.inner.lines(owner).await
        }

        async fn find_line(&self, owner: &str, product_id: &str) -> StoreResult<Option<CartLine>> {
            self.inner.find_line(owner, product_id).await
        }

        async fn increment_line(
            &self,
            owner: &str,
            line: CartLine,
            ceiling: i64,
        ) -> StoreResult<LineWrite> {
            if self.increments.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(StoreError::Db(DbError::ConnectionFailed("blip".to_string())));
            }
            self.inner.increment_line(owner, line, ceiling).await
        }

        async fn replace_quantity(
            &self,
            owner: &str,
            product_id: &str,
            quantity: i64,
        ) -> StoreResult<bool> {
            self.inner.replace_quantity(owner, product_id, quantity).await
        }

        async fn delete_line(&self, owner: &str, product_id: &str) -> StoreResult<bool> {
            self.inner.delete_line(owner, product_id).await
        }

        async fn delete_all(&self, owner: &str) -> StoreResult<()> {
            self.inner.delete_all(owner).await
        }
    }

    /// Runs `check` once against the server store and once against a guest store.
    async fn for_each_store<F, Fut>(check: F)
    where
        F: Fn(Database, Box<dyn CartStore>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let db = seeded_db().await;
        check(db.clone(), Box::new(ServerCartStore::new(db))).await;

        let db = seeded_db().await;
        check(db, Box::new(LocalCartStore::new())).await;
    }

    #[tokio::test]
    async fn test_add_two_gulab_jamun() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");

            let view = cart.add(GJ001_ID, 2).await.unwrap();
            assert_eq!(view.totals.total_items, 2);
            assert_eq!(view.totals.total_price, Money::from_rupees(560));
            assert_eq!(view.lines[0].slug, "gulab-jamun");
            assert_eq!(view.lines[0].images.len(), 2);
        })
        .await;
    }

    #[tokio::test]
    async fn test_add_merges_into_existing_line() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");

            cart.add(GJ001_ID, 3).await.unwrap();
            let view = cart.add(GJ001_ID, 2).await.unwrap();

            assert_eq!(view.lines.len(), 1);
            assert_eq!(view.quantity_of(GJ001_ID), Some(5));
        })
        .await;
    }

    #[tokio::test]
    async fn test_add_beyond_inventory() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");

            let err = cart.add(GJ001_ID, 60).await.unwrap_err();
            assert_eq!(
                err,
                CartError::InsufficientInventory {
                    product_id: GJ001_ID.to_string(),
                    available: 50,
                    requested: 60,
                }
            );
            assert!(cart.view().await.unwrap().lines.is_empty());

            cart.add(GJ001_ID, 48).await.unwrap();
            let err = cart.add(GJ001_ID, 3).await.unwrap_err();
            assert!(matches!(
                err,
                CartError::InsufficientInventory { requested: 51, .. }
            ));
            assert_eq!(cart.view().await.unwrap().quantity_of(GJ001_ID), Some(48));
        })
        .await;
    }

    #[tokio::test]
    async fn test_add_huge_quantity_is_rejected() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            cart.add(GJ001_ID, 1).await.unwrap();

            let err = cart.add(GJ001_ID, i64::MAX).await.unwrap_err();
            assert!(matches!(
                err,
                CartError::InsufficientInventory { available: 50, .. }
            ));
            assert_eq!(cart.view().await.unwrap().quantity_of(GJ001_ID), Some(1));
        })
        .await;
    }

    #[tokio::test]
    async fn test_line_keeps_first_snapshot() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            cart.add(GJ001_ID, 2).await.unwrap();

            let mut relisted = gulab_jamun();
            relisted.name = "Gulab Jamun (Festive Box)".to_string();
            relisted.price_paise = 32_000;
            relisted.slug = "gulab-jamun-festive".to_string();
            relisted.images = vec!["/images/products/gulab-jamun-festive.svg".to_string()];
            let catalog = FixedCatalog(relisted);
            let relisted_cart = CartReconciler::new(&catalog, store.as_ref(), "user-1");

            let view = relisted_cart.add(GJ001_ID, 1).await.unwrap();
            assert_eq!(view.lines.len(), 1);
            let line = &view.lines[0];
            assert_eq!(line.quantity, 3);
            assert_eq!(line.name, "Gulab Jamun");
            assert_eq!(line.unit_price_paise, 28_000);
            assert_eq!(line.slug, "gulab-jamun");
            assert_eq!(line.images.len(), 2);
            assert_eq!(view.totals.total_price, Money::from_rupees(280 * 3));
        })
        .await;
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            assert_eq!(
                cart.add(GJ001_ID, 0).await.unwrap_err(),
                CartError::InvalidQuantity(0)
            );
            assert_eq!(
                cart.add(GJ001_ID, -2).await.unwrap_err(),
                CartError::InvalidQuantity(-2)
            );
        })
        .await;
    }

    #[tokio::test]
    async fn test_add_unknown_or_inactive_product() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");

            assert!(matches!(
                cart.add("no-such-product", 1).await,
                Err(CartError::ProductNotFound(_))
            ));

            db.products().set_active(KAJU_KATLI_ID, false).await.unwrap();
            assert!(matches!(
                cart.add(KAJU_KATLI_ID, 1).await,
                Err(CartError::ProductNotFound(_))
            ));
        })
        .await;
    }

    #[tokio::test]
    async fn test_set_quantity() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            cart.add(GJ001_ID, 2).await.unwrap();

            let view = cart.set_quantity(GJ001_ID, 7).await.unwrap();
            assert_eq!(view.quantity_of(GJ001_ID), Some(7));
            assert_eq!(view.totals.total_price, Money::from_rupees(280 * 7));

            assert!(matches!(
                cart.set_quantity(GJ001_ID, 51).await,
                Err(CartError::InsufficientInventory { .. })
            ));
            assert!(matches!(
                cart.set_quantity(KAJU_KATLI_ID, 1).await,
                Err(CartError::LineNotFound(_))
            ));
        })
        .await;
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes_line() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            cart.add(GJ001_ID, 2).await.unwrap();

            let view = cart.set_quantity(GJ001_ID, 0).await.unwrap();
            assert!(view.lines.is_empty());
            assert_eq!(view.totals.total_price, Money::zero());
        })
        .await;
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");
            cart.add(GJ001_ID, 2).await.unwrap();
            cart.add(KAJU_KATLI_ID, 1).await.unwrap();

            let view = cart.remove(GJ001_ID).await.unwrap();
            assert_eq!(view.totals.line_count, 1);

            let again = cart.remove(GJ001_ID).await.unwrap();
            assert_eq!(again, view);

            let cleared = cart.clear().await.unwrap();
            assert_eq!(cleared, CartView::empty());
        })
        .await;
    }

    #[tokio::test]
    async fn test_owners_do_not_share_lines() {
        for_each_store(|db, store| async move {
            let alice = CartReconciler::new(&db, store.as_ref(), "alice");
            let bob = CartReconciler::new(&db, store.as_ref(), "bob");

            alice.add(GJ001_ID, 2).await.unwrap();
            assert!(bob.view().await.unwrap().lines.is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_adds_sum() {
        for_each_store(|db, store| async move {
            let cart = CartReconciler::new(&db, store.as_ref(), "user-1");

            let (a, b, c) = tokio::join!(
                cart.add(GJ001_ID, 3),
                cart.add(GJ001_ID, 4),
                cart.add(GJ001_ID, 5)
            );
            a.unwrap();
            b.unwrap();
            c.unwrap();

            assert_eq!(cart.view().await.unwrap().quantity_of(GJ001_ID), Some(12));
        })
        .await;
    }

    #[tokio::test]
    async fn test_store_failure_is_retryable() {
        let stores = FailingStores::unreachable();
        let cart = CartReconciler::new(&stores, &stores, "user-1");

        let err = cart.add(GJ001_ID, 1).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(cart.view().await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_persistent_store_error_is_not_retryable() {
        let stores = FailingStores::broken();
        let cart = CartReconciler::new(&stores, &stores, "user-1");

        let err = cart.add(GJ001_ID, 1).await.unwrap_err();
        assert!(matches!(err, CartError::StoreFailed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_merge_guest_cart() {
        let db = seeded_db().await;
        let server = ServerCartStore::new(db.clone());
        let local = LocalCartStore::new();

        let guest = CartReconciler::new(&db, &local, "guest-session");
        let user = CartReconciler::new(&db, &server, "user-1");

        guest.add(GJ001_ID, 3).await.unwrap();
        guest.add(KAJU_KATLI_ID, 2).await.unwrap();
        user.add(GJ001_ID, 2).await.unwrap();

        db.products().set_active(KAJU_KATLI_ID, false).await.unwrap();

        let report = merge_guest_cart(&guest, &user).await.unwrap();

        assert_eq!(report.merged, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].product_id, KAJU_KATLI_ID);
        assert_eq!(report.cart.quantity_of(GJ001_ID), Some(5));
        assert!(guest.view().await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_merge_aborts_when_user_store_unavailable() {
        let db = seeded_db().await;
        let local = LocalCartStore::new();
        let failing = FailingStores::unreachable();

        let guest = CartReconciler::new(&db, &local, "guest-session");
        let user = CartReconciler::new(&db, &failing, "user-1");
        guest.add(GJ001_ID, 1).await.unwrap();

        let err = merge_guest_cart(&guest, &user).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(guest.view().await.unwrap().quantity_of(GJ001_ID), Some(1));
    }

    #[tokio::test]
    async fn test_merge_retry_replays_only_pending_lines() {
        let db = seeded_db().await;
        let local = LocalCartStore::new();
        let server = FlakyCartStore::failing_on(ServerCartStore::new(db.clone()), 2);

        let guest = CartReconciler::new(&db, &local, "guest-session");
        let user = CartReconciler::new(&db, &server, "user-1");
        guest.add(GJ001_ID, 3).await.unwrap();
        guest.add(KAJU_KATLI_ID, 2).await.unwrap();

        let err = merge_guest_cart(&guest, &user).await.unwrap_err();
        assert!(err.is_retryable());

        let pending = guest.view().await.unwrap();
        assert_eq!(pending.quantity_of(GJ001_ID), None);
        assert_eq!(pending.quantity_of(KAJU_KATLI_ID), Some(2));

        let report = merge_guest_cart(&guest, &user).await.unwrap();
        assert_eq!(report.cart.quantity_of(GJ001_ID), Some(3));
        assert_eq!(report.cart.quantity_of(KAJU_KATLI_ID), Some(2));
        assert!(report.skipped.is_empty());
        assert!(guest.view().await.unwrap().lines.is_empty());
    }
}
