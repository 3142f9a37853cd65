//! # Cart Module
//!
//! Cart lines, the per-owner line set, and the rules every cart mutation
//! must pass.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Shopper Action           Rule Check               Line Set Change      │
//! │  ──────────────           ──────────               ───────────────      │
//! │                                                                         │
//! │  Add to cart ───────────► check_add() ───────────► qty += n / new line  │
//! │                                                                         │
//! │  Change quantity ───────► check_set_quantity() ──► qty = n              │
//! │    (n <= 0) ────────────────────────────────────► remove line          │
//! │                                                                         │
//! │  Remove ────────────────────────────────────────► drop line (no-op if  │
//! │                                                    absent)              │
//! │  Clear ─────────────────────────────────────────► drop all lines       │
//! │                                                                         │
//! │  Every change ends with CartTotals recomputed from the line set.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per product
//! - Every stored quantity is > 0 and ≤ the product's inventory when written
//! - Totals are derived, never stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Cart Line
// =============================================================================

/// One product in a cart.
///
/// Name, price, images, and slug are frozen when the line is first created.
/// Later catalog edits do not change what the shopper sees in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    pub name: String,
    pub unit_price_paise: i64,
    pub images: Vec<String>,
    pub slug: String,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Snapshots a product into a new line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            quantity,
            name: product.name.clone(),
            unit_price_paise: product.price_paise,
            images: product.images.clone(),
            slug: product.slug.clone(),
            added_at: Utc::now(),
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }
}

// =============================================================================
// Totals & View
// =============================================================================

/// Aggregates over a line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Number of distinct products.
    pub line_count: usize,
    /// Σ quantity.
    pub total_items: i64,
    /// Σ unit price × quantity.
    pub total_price: Money,
}

impl CartTotals {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        CartTotals {
            line_count: lines.len(),
            total_items: lines.iter().map(|l| l.quantity).sum(),
            total_price: lines.iter().map(CartLine::line_total).sum(),
        }
    }
}

/// What every cart operation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartView {
    pub fn new(lines: Vec<CartLine>) -> Self {
        let totals = CartTotals::from_lines(&lines);
        CartView { lines, totals }
    }

    pub fn empty() -> Self {
        CartView::new(Vec::new())
    }

    pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
    }
}

// =============================================================================
// Cart (in-memory line set)
// =============================================================================

/// An owner's line set held in memory.
///
/// Serialized as-is for guest cart snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn find(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Adds `line.quantity` to an existing line, or inserts `line`.
    ///
    /// The resulting quantity must not exceed `ceiling`; if it would, nothing
    /// changes and `None` is returned. Otherwise returns the new quantity.
    pub fn increment(&mut self, line: CartLine, ceiling: i64) -> Option<i64> {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                let next = existing
                    .quantity
                    .checked_add(line.quantity)
                    .filter(|next| *next <= ceiling)?;
                existing.quantity = next;
                Some(next)
            }
            None => {
                if line.quantity > ceiling {
                    return None;
                }
                let quantity = line.quantity;
                self.lines.push(line);
                Some(quantity)
            }
        }
    }

    /// Overwrites the quantity of an existing line. Returns `false` if absent.
    pub fn replace_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line. Returns whether a line was present.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.lines)
    }

    pub fn view(&self) -> CartView {
        CartView::new(self.lines.clone())
    }
}

// =============================================================================
// Mutation Rules
// =============================================================================

fn require_active<'a>(product_id: &str, product: Option<&'a Product>) -> CartResult<&'a Product> {
    match product {
        Some(p) if p.is_active => Ok(p),
        _ => Err(CartError::ProductNotFound(product_id.to_string())),
    }
}

/// Checks an `add` of `quantity` on top of `existing` units already in the
/// cart. Returns the product and the quantity the line would end up with.
///
/// ## Errors
/// - `InvalidQuantity` when `quantity <= 0`
/// - `ProductNotFound` when the product is missing or inactive
/// - `InsufficientInventory` when `existing + quantity` exceeds stock or
///   does not fit in an `i64`
pub fn check_add<'a>(
    product_id: &str,
    product: Option<&'a Product>,
    existing: i64,
    quantity: i64,
) -> CartResult<(&'a Product, i64)> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity(quantity));
    }

    let product = require_active(product_id, product)?;

    match existing.checked_add(quantity) {
        Some(requested) if product.has_stock_for(requested) => Ok((product, requested)),
        _ => Err(CartError::InsufficientInventory {
            product_id: product_id.to_string(),
            available: product.inventory_qty,
            requested: existing.saturating_add(quantity),
        }),
    }
}

/// Checks a `set_quantity` to a positive `quantity`.
///
/// Callers route `quantity <= 0` to removal before calling this.
pub fn check_set_quantity<'a>(
    product_id: &str,
    product: Option<&'a Product>,
    quantity: i64,
) -> CartResult<&'a Product> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity(quantity));
    }

    let product = require_active(product_id, product)?;

    if !product.has_stock_for(quantity) {
        return Err(CartError::InsufficientInventory {
            product_id: product_id.to_string(),
            available: product.inventory_qty,
            requested: quantity,
        });
    }

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================
