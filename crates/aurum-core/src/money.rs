//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! pure arithmetic behind sale totals.
//!
//! ## Why Integer Money?
//! Floating point cannot represent retail prices exactly (`0.1 + 0.2 !=
//! 0.3`). Every monetary value in the system is therefore an `i64` count of
//! cents: the database stores cents, the API transports cents, and only a
//! display layer would ever format them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::CoreError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and corrections may produce negative
///   intermediate values that the caller must then reject or absorb
/// - **Single-field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks whether the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;
    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl fmt::Display for Money {
    /// Formats as major.minor units, e.g. `12.34`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Sale Arithmetic
// =============================================================================

/// Subtotal of one sale line: unit price × quantity.
#[inline]
pub fn line_subtotal(unit_price: Money, quantity: i64) -> Money {
    unit_price * quantity
}

/// Final value of a sale: sum of line subtotals minus the discount.
///
/// Fails with [`CoreError::InvalidDiscount`] when the discount exceeds the
/// items total — a sale can be free, never negative.
pub fn sale_total(subtotal_sum: Money, discount: Money) -> Result<Money, CoreError> {
    let total = subtotal_sum - discount;
    if total.is_negative() {
        return Err(CoreError::InvalidDiscount {
            subtotal_cents: subtotal_sum.cents(),
            discount_cents: discount.cents(),
        });
    }
    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1099);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1599);
        assert_eq!((a - b).cents(), 599);
        assert_eq!((a * 3).cents(), 3297);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 400);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_line_subtotal() {
        let subtotal = line_subtotal(Money::from_cents(1500), 3);
        assert_eq!(subtotal.cents(), 4500);
    }

    #[test]
    fn test_sale_total() {
        let total = sale_total(Money::from_cents(5000), Money::from_cents(1000)).unwrap();
        assert_eq!(total.cents(), 4000);
    }

    #[test]
    fn test_sale_total_free_is_allowed() {
        let total = sale_total(Money::from_cents(5000), Money::from_cents(5000)).unwrap();
        assert_eq!(total, Money::zero());
    }

    #[test]
    fn test_sale_total_rejects_oversized_discount() {
        let err = sale_total(Money::from_cents(50), Money::from_cents(1000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidDiscount {
                subtotal_cents: 50,
                discount_cents: 1000
            }
        ));
    }
}
