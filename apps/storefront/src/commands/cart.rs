//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│  Order   │       │
//! │  │  Cart    │     │          │     │ (coupon) │     │  Placed  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                                │
//! │                   add_to_cart                                          │
//! │                   update_cart_item                                     │
//! │                   remove_from_cart                                     │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! │                                                                         │
//! │  Guest signs in ──► merge_cart_on_sign_in ──► user cart                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use sweets_core::validation::validate_quantity;
use sweets_core::CartView;

use crate::error::ApiError;
use crate::services::{merge_guest_cart, MergeReport};
use crate::state::{AppState, Identity};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    /// Defaults to 1.
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub product_id: String,
    /// `0` or less removes the line.
    pub quantity: i64,
}

/// Gets the current cart contents.
pub async fn get_cart(state: &AppState, identity: &Identity) -> Result<CartView, ApiError> {
    debug!(owner = %identity.key(), "get_cart command");
    Ok(state.cart_for(identity).view().await?)
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - If product already in cart: quantity increases
/// - If product not in cart: added as new line with a snapshot of name,
///   price, images, and slug
/// - Cumulative quantity may never exceed the product's inventory
#[tracing::instrument(skip(state), fields(owner = %identity.key()))]
pub async fn add_to_cart(
    state: &AppState,
    identity: &Identity,
    request: AddToCartRequest,
) -> Result<CartView, ApiError> {
    let quantity = request.quantity.unwrap_or(1);
    validate_quantity(quantity)?;

    Ok(state
        .cart_for(identity)
        .add(&request.product_id, quantity)
        .await?)
}

/// Sets a line's quantity. Zero or negative removes the line.
pub async fn update_cart_item(
    state: &AppState,
    identity: &Identity,
    request: UpdateCartItemRequest,
) -> Result<CartView, ApiError> {
    debug!(
        owner = %identity.key(),
        product_id = %request.product_id,
        quantity = request.quantity,
        "update_cart_item command"
    );
    Ok(state
        .cart_for(identity)
        .set_quantity(&request.product_id, request.quantity)
        .await?)
}

/// Removes a line. Removing a product not in the cart succeeds unchanged.
pub async fn remove_from_cart(
    state: &AppState,
    identity: &Identity,
    product_id: &str,
) -> Result<CartView, ApiError> {
    debug!(owner = %identity.key(), product_id = %product_id, "remove_from_cart command");
    Ok(state.cart_for(identity).remove(product_id).await?)
}

pub async fn clear_cart(state: &AppState, identity: &Identity) -> Result<CartView, ApiError> {
    debug!(owner = %identity.key(), "clear_cart command");
    Ok(state.cart_for(identity).clear().await?)
}

/// Moves a guest session's cart into the signed-in user's cart.
///
/// ```text
/// guest-session: GJ001 ×3, KK002 ×2 (delisted)
/// user-1:        GJ001 ×2
///        │
///        ▼
/// user-1:        GJ001 ×5          skipped: [KK002]
/// guest-session: (empty)
/// ```
pub async fn merge_cart_on_sign_in(
    state: &AppState,
    guest_session_id: &str,
    user_id: &str,
) -> Result<MergeReport, ApiError> {
    debug!(guest = %guest_session_id, user = %user_id, "merge_cart_on_sign_in command");

    let guest = state.cart_for(&Identity::Guest(guest_session_id.to_string()));
    let user = state.cart_for(&Identity::User(user_id.to_string()));

    Ok(merge_guest_cart(&guest, &user).await?)
}

/// Serialized guest cart, in the shape the browser keeps in local storage.
pub fn export_guest_cart(state: &AppState, guest_session_id: &str) -> Result<String, ApiError> {
    Ok(state.guest_carts().export_snapshot(guest_session_id)?)
}

/// Replaces a guest session's cart with a browser-held snapshot.
pub async fn restore_guest_cart(
    state: &AppState,
    guest_session_id: &str,
    snapshot: &str,
) -> Result<CartView, ApiError> {
    state
        .guest_carts()
        .restore_snapshot(guest_session_id, snapshot)?;
    get_cart(state, &Identity::Guest(guest_session_id.to_string())).await
}
