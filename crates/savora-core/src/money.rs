//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a storefront that renders the same order on three pages:            │
//! │    checkout says 229.00€, the admin page says 228.99€ → support ticket  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All arithmetic is exact; rounding happens exactly once, where a      │
//! │    division occurs (percentage discounts, inclusive-VAT back-out),      │
//! │    and always rounds half up to the minor unit.                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use savora_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99€
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // 21.98€
//! let total = price + Money::from_cents(500); // 15.99€
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::VatRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (euro cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediates (e.g. refund math)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  OrderItem.unit_price ──► OrderItem.line_total ──► items subtotal       │
/// │                                                                         │
/// │  subtotal ──► coupon discount ──► VAT split ──► Order.total             │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99€
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (euros and cents).
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // 10.99€
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50€, not -4.50€
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        // Handle sign: if major is negative, minor should subtract
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (euros) portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Clamps a (possibly negative) amount to zero.
    ///
    /// Used when a discount could otherwise push a total below zero.
    #[inline]
    pub const fn floor_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // 2.99€
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // 8.97€
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns a percentage of this amount, in basis points.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF UP, ONCE                                                │
    /// │                                                                     │
    /// │  discount = amount × bps / 10000                                    │
    /// │                                                                     │
    /// │  The division is the ONLY place sub-cent precision can appear,      │
    /// │  so the rounding is applied exactly once, here, never per line.     │
    /// │  Implementation: (amount × bps + 5000) / 10000 in i128.             │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(25000); // 250.00€
    /// let discount = subtotal.percentage_of(1000); // 10%
    /// assert_eq!(discount.cents(), 2500); // 25.00€
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        // Use i128 to prevent overflow on large amounts
        // bps is basis points: 1000 = 10.00%
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Calculates the VAT charged ON TOP of this (net) amount.
    ///
    /// Used when stored prices are net of VAT (`vat_price_inclusive = false`).
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    /// use savora_core::types::VatRate;
    ///
    /// let net = Money::from_cents(10000); // 100.00€
    /// let vat = net.vat_on_net(VatRate::from_bps(1900)); // 19%
    /// assert_eq!(vat.cents(), 1900); // 19.00€
    /// ```
    pub fn vat_on_net(&self, rate: VatRate) -> Money {
        self.percentage_of(rate.bps())
    }

    /// Backs the net amount out of a gross (VAT-inclusive) amount.
    ///
    /// Used when stored prices already include VAT
    /// (`vat_price_inclusive = true`):
    ///
    /// ```text
    /// net = gross / (1 + rate)      vat = gross - net
    /// ```
    ///
    /// The quotient is rounded half up to the cent; the VAT portion is then
    /// derived by exact subtraction, so `net + vat == gross` always holds.
    ///
    /// ## Example
    /// ```rust
    /// use savora_core::money::Money;
    /// use savora_core::types::VatRate;
    ///
    /// let gross = Money::from_cents(20000); // 200.00€ incl. 7% VAT
    /// let net = gross.net_of_inclusive(VatRate::from_bps(700));
    /// assert_eq!(net.cents(), 18692); // 186.92€
    /// assert_eq!((gross - net).cents(), 1308); // 13.08€ VAT
    /// ```
    pub fn net_of_inclusive(&self, rate: VatRate) -> Money {
        let denom = 10000i128 + rate.bps() as i128;
        let net = (self.0 as i128 * 10000 + denom / 2) / denom;
        Money::from_cents(net as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}€", sign, self.euros().abs(), self.cents_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation of line totals.
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
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.euros(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99€");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00€");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50€");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00€");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum_of_line_totals() {
        let lines = [
            Money::from_cents(1099),
            Money::from_cents(500),
            Money::from_cents(1),
        ];
        let total: Money = lines.iter().copied().sum();
        assert_eq!(total.cents(), 1600);
    }

    #[test]
    fn test_percentage_of_basic() {
        // 250.00€ at 10% = 25.00€
        let subtotal = Money::from_cents(25000);
        assert_eq!(subtotal.percentage_of(1000).cents(), 2500);
    }

    #[test]
    fn test_percentage_of_rounds_half_up() {
        // 0.05€ at 10% = 0.005€ → rounds up to 0.01€
        let amount = Money::from_cents(5);
        assert_eq!(amount.percentage_of(1000).cents(), 1);

        // 0.04€ at 10% = 0.004€ → rounds down to 0.00€
        let amount = Money::from_cents(4);
        assert_eq!(amount.percentage_of(1000).cents(), 0);
    }

    #[test]
    fn test_vat_on_net() {
        // 100.00€ net at 19% = 19.00€ VAT
        let net = Money::from_cents(10000);
        assert_eq!(net.vat_on_net(VatRate::from_bps(1900)).cents(), 1900);

        // 10.99€ net at 7% = 0.7693€ → 0.77€
        let net = Money::from_cents(1099);
        assert_eq!(net.vat_on_net(VatRate::from_bps(700)).cents(), 77);
    }

    #[test]
    fn test_net_of_inclusive() {
        // 200.00€ gross at 7% → 186.92€ net / 13.08€ VAT
        let gross = Money::from_cents(20000);
        let net = gross.net_of_inclusive(VatRate::from_bps(700));
        assert_eq!(net.cents(), 18692);
        assert_eq!((gross - net).cents(), 1308);

        // 49.00€ gross at 19% → 41.18€ net / 7.82€ VAT
        let gross = Money::from_cents(4900);
        let net = gross.net_of_inclusive(VatRate::from_bps(1900));
        assert_eq!(net.cents(), 4118);
        assert_eq!((gross - net).cents(), 782);
    }

    #[test]
    fn test_net_plus_vat_reconstructs_gross() {
        // The back-out must be loss-free for any gross amount
        for gross_cents in [1, 99, 100, 4900, 20000, 123456789] {
            let gross = Money::from_cents(gross_cents);
            let net = gross.net_of_inclusive(VatRate::from_bps(1900));
            let vat = gross - net;
            assert_eq!((net + vat).cents(), gross_cents);
        }
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-100).floor_at_zero().cents(), 0);
        assert_eq!(Money::from_cents(100).floor_at_zero().cents(), 100);
        assert_eq!(Money::zero().floor_at_zero().cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line_total = unit_price.multiply_quantity(3);
        assert_eq!(line_total.cents(), 897);
    }
}
