//! # Money Module
//!
//! Provides the `Money` type for rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rupiah has no minor unit in day-to-day retail, so one unit = Rp1.     │
//! │                                                                         │
//! │  Prices, invoice totals, supplier costs and payment amounts are all    │
//! │  whole rupiah stored as INTEGER. No floating point anywhere, and the   │
//! │  only rounding happens in percentage discounts (half-up, explicit).    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use toko_core::money::Money;
//!
//! let price = Money::from_rupiah(15_000);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.to_string(), "Rp45.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
const FULL_BPS: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole rupiah.
///
/// Signed so that differences (old price vs new price) stay representable.
/// Stored in SQLite as a plain INTEGER column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use toko_core::money::Money;
    ///
    /// let price = Money::from_rupiah(12_500);
    /// assert_eq!(price.rupiah(), 12_500);
    /// ```
    #[inline]
    pub const fn from_rupiah(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the amount in whole rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
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

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use toko_core::money::Money;
    ///
    /// let unit_price = Money::from_rupiah(3_500);
    /// assert_eq!(unit_price.multiply_quantity(4).rupiah(), 14_000);
    /// ```
    ///
    /// Saturates at the `i64` bounds. Use [`Money::checked_multiply_quantity`]
    /// where an out-of-range result must be reported.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }

    /// Sums `quantity x unit price` pairs, `None` if any step overflows.
    ///
    /// ```rust
    /// use toko_core::money::Money;
    ///
    /// let lines = [(Money::from_rupiah(2_000), 3), (Money::from_rupiah(500), 2)];
    /// assert_eq!(Money::checked_total(lines), Some(Money::from_rupiah(7_000)));
    /// assert_eq!(Money::checked_total([(Money::from_rupiah(i64::MAX), 2)]), None);
    /// ```
    pub fn checked_total<I>(lines: I) -> Option<Money>
    where
        I: IntoIterator<Item = (Money, i64)>,
    {
        lines.into_iter().try_fold(Money::zero(), |acc, (price, qty)| {
            acc.checked_add(price.checked_multiply_quantity(qty)?)
        })
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// The discount amount is rounded half-up to the nearest rupiah before
    /// it is subtracted.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use toko_core::money::Money;
    ///
    /// let cost = Money::from_rupiah(10_000);
    /// assert_eq!(cost.apply_percentage_discount(1_000).rupiah(), 9_000);
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        // i128 so large wholesale totals cannot overflow the intermediate
        let discount_amount = (self.0 as i128 * discount_bps as i128 + FULL_BPS / 2) / FULL_BPS;
        Money(self.0 - discount_amount as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Operators saturate at the i64 bounds instead of panicking or wrapping.
// Totals that reach the database go through the checked_* methods.

/// Indonesian formatting: `Rp` prefix and `.` as thousands separator.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp{}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupiah() {
        let money = Money::from_rupiah(15_000);
        assert_eq!(money.rupiah(), 15_000);
        assert!(money.is_positive());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupiah(0).to_string(), "Rp0");
        assert_eq!(Money::from_rupiah(500).to_string(), "Rp500");
        assert_eq!(Money::from_rupiah(1_000).to_string(), "Rp1.000");
        assert_eq!(Money::from_rupiah(45_000).to_string(), "Rp45.000");
        assert_eq!(Money::from_rupiah(1_250_000).to_string(), "Rp1.250.000");
        assert_eq!(Money::from_rupiah(-7_500).to_string(), "-Rp7.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupiah(10_000);
        let b = Money::from_rupiah(2_500);

        assert_eq!((a + b).rupiah(), 12_500);
        assert_eq!((a - b).rupiah(), 7_500);
        assert_eq!((a * 3).rupiah(), 30_000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.rupiah(), 15_000);
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        // 5% of 10.010 = 500.5 → 501
        let cost = Money::from_rupiah(10_010);
        assert_eq!(cost.apply_percentage_discount(500).rupiah(), 9_509);

        // 2.5% of 9.000 = 225 exactly
        let cost = Money::from_rupiah(9_000);
        assert_eq!(cost.apply_percentage_discount(250).rupiah(), 8_775);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_rupiah(10_i64.pow(16));
        assert_eq!(huge.checked_multiply_quantity(999), None);
        assert_eq!(huge.multiply_quantity(999).rupiah(), i64::MAX);
        assert_eq!(Money::from_rupiah(i64::MAX).checked_add(Money::from_rupiah(1)), None);
        assert_eq!(
            Money::checked_total([(huge, 1), (huge, 1)]),
            Some(Money::from_rupiah(2 * 10_i64.pow(16)))
        );
        assert_eq!(Money::checked_total([(huge, 500), (huge, 500)]), None);

        let max = Money::from_rupiah(i64::MAX);
        assert_eq!([max, max].into_iter().sum::<Money>(), max);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(Money::from_rupiah(-1).is_negative());
    }
}
