//! # Storefront Commands
//!
//! The entry points the web frontend's route handlers call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── cart.rs       ◄─── Cart view and mutations, guest merge
//! └── promotion.rs  ◄─── Apply coupon, record redemptions, admin
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route handler                                                          │
//! │  ─────────────                                                          │
//! │  POST /api/cart { productId, quantity }                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn add_to_cart(                                                  │
//! │      state: &AppState,       ◄── Built once at startup                  │
//! │      identity: &Identity,    ◄── Session or signed-in user              │
//! │      request: AddToCartRequest,                                         │
//! │  ) -> Result<CartView, ApiError>                                        │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  { lines: [...], totals: { lineCount, totalItems, totalPrice } }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod promotion;
