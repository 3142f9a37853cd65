//! # Services
//!
//! Orchestration over the store traits. Rules come from `sweets-core`;
//! storage comes from whatever implements the traits in [`crate::store`].
//!
//! - [`DiscountResolver`] - promotion first, coupon second
//! - [`CartReconciler`] - add / set / remove / clear / view for one owner
//! - [`merge_guest_cart`] - carries a guest cart into a user's cart at sign-in

mod cart;
mod discount;

pub use cart::{merge_guest_cart, CartReconciler, MergeReport, SkippedLine};
pub use discount::DiscountResolver;
