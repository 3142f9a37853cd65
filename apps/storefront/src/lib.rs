//! # Sweets Storefront Library
//!
//! Application layer for the storefront: discount resolution, cart
//! reconciliation across server and guest stores, and the command surface
//! the web frontend calls.
//!
//! ## Module Organization
//! ```text
//! sweets_storefront/
//! ├── lib.rs          ◄─── You are here (tracing setup)
//! ├── config.rs       ◄─── StorefrontConfig from STOREFRONT_* env vars
//! ├── state.rs        ◄─── AppState, Identity → cart store routing
//! ├── store/
//! │   ├── mod.rs      ◄─── Capability traits, StoreError
//! │   ├── sqlite.rs   ◄─── Catalog/promotion/coupon lookups on Database
//! │   ├── server.rs   ◄─── ServerCartStore (cart_items)
//! │   └── local.rs    ◄─── LocalCartStore (guest sessions)
//! ├── services/
//! │   ├── discount.rs ◄─── DiscountResolver
//! │   └── cart.rs     ◄─── CartReconciler, merge_guest_cart
//! ├── commands/
//! │   ├── cart.rs     ◄─── Cart commands
//! │   └── promotion.rs◄─── apply_coupon, redemptions, admin
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sweets=trace` - Show trace for sweets crates only
/// - Default: `default_filter` (normally `info,sweets=debug,sqlx=warn`)
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
