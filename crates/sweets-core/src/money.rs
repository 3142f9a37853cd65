//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 10% coupon on ₹333.33 is ₹33.333…                                    │
//! │    Float totals drift a paisa at a time across a cart                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise (1 rupee = 100 paise)                      │
//! │    33333 paise × 1000 bps / 10000 = 3333 paise (rounded)               │
//! │    Every rounding step happens exactly once, in one place               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sweets_core::money::Money;
//!
//! let price = Money::from_rupees(280);       // ₹280.00
//! let line = price * 2;                      // ₹560.00
//! assert_eq!(line.paise(), 56_000);
//!
//! // 10% of ₹3000
//! let discount = Money::from_rupees(3000).percentage(1000);
//! assert_eq!(discount, Money::from_rupees(300));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

/// Currency symbol used when rendering amounts in messages.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Basis points in one whole (100%).
pub const BPS_PER_WHOLE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (the smallest INR unit).
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartLine.unit_price ──► CartTotals.total_price
///                                                  │
///                                                  ▼
///                       DiscountResolver(order_value) ──► discount
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use sweets_core::money::Money;
    ///
    /// let price = Money::from_paise(28_050); // ₹280.50
    /// assert_eq!(price.paise(), 28_050);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Computes `bps` basis points of this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math in i128: `(paise × bps + 5000) / 10000`.
    ///
    /// ```rust
    /// use sweets_core::money::Money;
    ///
    /// // 10% of ₹3000.00 = ₹300.00
    /// assert_eq!(Money::from_rupees(3000).percentage(1000).paise(), 30_000);
    ///
    /// // 12.5% of ₹0.99 = 12.375 paise → 12 paise
    /// assert_eq!(Money::from_paise(99).percentage(1250).paise(), 12);
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        let half = (BPS_PER_WHOLE / 2) as i128;
        let raw = self.0 as i128 * bps as i128;
        let rounded = if raw >= 0 {
            (raw + half) / BPS_PER_WHOLE as i128
        } else {
            (raw - half) / BPS_PER_WHOLE as i128
        };
        Money(rounded as i64)
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn times(&self, quantity: i64) -> Self {
        Money(self.0 * quantity)
    }

    /// Returns the smaller of two amounts (used for discount caps).
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `₹1234.50` (no digit grouping).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{:02}",
            sign,
            CURRENCY_SYMBOL,
            self.rupees().abs(),
            self.paise_part()
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: i64) -> Self {
        Money(self.0 * quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees_and_parts() {
        let money = Money::from_paise(28_050);
        assert_eq!(money.rupees(), 280);
        assert_eq!(money.paise_part(), 50);
        assert_eq!(Money::from_rupees(280).paise(), 28_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupees(500).to_string(), "₹500.00");
        assert_eq!(Money::from_paise(28_050).to_string(), "₹280.50");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 10% of ₹0.05 = 0.5 paise → 1 paisa
        assert_eq!(Money::from_paise(5).percentage(1000).paise(), 1);
        // 10% of ₹0.04 = 0.4 paise → 0
        assert_eq!(Money::from_paise(4).percentage(1000).paise(), 0);
        // 25% of ₹499.00
        assert_eq!(Money::from_rupees(499).percentage(2500).paise(), 12_475);
    }

    #[test]
    fn test_percentage_of_zero() {
        assert!(Money::zero().percentage(2000).is_zero());
    }

    #[test]
    fn test_min_and_sum() {
        let a = Money::from_rupees(300);
        let b = Money::from_rupees(200);
        assert_eq!(a.min(b), b);
        assert_eq!(b.min(a), b);

        let total: Money = vec![a, b, Money::from_paise(50)].into_iter().sum();
        assert_eq!(total.paise(), 50_050);
    }

    #[test]
    fn test_times_matches_mul() {
        let unit = Money::from_rupees(280);
        assert_eq!(unit.times(2), unit * 2);
        assert_eq!(unit.times(2).paise(), 56_000);
    }
}
