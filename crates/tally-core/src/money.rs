//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! VAT arithmetic used by carts, orders and invoices.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    $10.00 / 3 = $3.33 (×3 = $9.99)  → Lost $0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                         │
//! │    We KNOW we lost 1 cent, and handle it explicitly                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EXCLUSIVE (prices are net, tax added on top)                           │
//! │    subtotal = Σ line totals                                             │
//! │    tax      = subtotal × rate                                           │
//! │    total    = subtotal + tax                                            │
//! │                                                                         │
//! │  INCLUSIVE (prices already contain tax)                                 │
//! │    total    = Σ line totals                                             │
//! │    tax      = total × rate / (100 + rate)                               │
//! │    subtotal = total − tax                                               │
//! │                                                                         │
//! │  Either way: total == subtotal + tax, always.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is rounded to a whole cent once per computed aggregate, never per
//! line before summing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type: catalog
/// prices, cart line totals, order totals, payment amounts, invoice totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Tax to add on top of a net amount (exclusive pricing).
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount × bps + 5000) / 10000`.
    /// Uses i128 internally to prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_cents(2500);  // 25.00
    /// let rate = TaxRate::from_bps(1500);      // 15%
    /// assert_eq!(subtotal.tax_portion(rate).cents(), 375); // 3.75
    /// ```
    pub fn tax_portion(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax as i64)
    }

    /// Tax already contained inside a gross amount (inclusive pricing).
    ///
    /// ## Implementation
    /// `tax = gross × bps / (10000 + bps)`, half-up rounding, i128
    /// intermediate. Inverse of [`Money::tax_portion`]: splitting a gross
    /// amount and re-adding the tax reproduces the original split.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, TaxRate};
    ///
    /// let gross = Money::from_cents(2875);  // 28.75, tax included
    /// let rate = TaxRate::from_bps(1500);   // 15%
    /// assert_eq!(gross.tax_within(rate).cents(), 375); // 3.75
    /// ```
    pub fn tax_within(&self, rate: TaxRate) -> Money {
        let divisor = 10000 + rate.bps() as i128;
        let tax = (self.0 as i128 * rate.bps() as i128 + divisor / 2) / divisor;
        Money::from_cents(tax as i64)
    }

    /// Formats the value with a currency symbol for document output.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).formatted("€"), "€10.99");
    /// assert_eq!(Money::from_cents(-550).formatted("$"), "-$5.50");
    /// ```
    pub fn formatted(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Document projections format with the
/// organization's currency symbol via [`Money::formatted`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted("$"))
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

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation of an iterator of Money values.
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15.00% VAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Pricing Mode
// =============================================================================

/// Whether catalog prices already contain tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Price + tax shown separately (USA model).
    Exclusive,
    /// Price includes tax (EU/GCC model).
    Inclusive,
}

impl Default for PricingMode {
    fn default() -> Self {
        PricingMode::Exclusive
    }
}

// =============================================================================
// Totals
// =============================================================================

/// The monetary summary of a cart, order or invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Totals {
    /// All-zero totals (empty cart).
    pub const fn zero() -> Self {
        Totals {
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
        }
    }

    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Computes subtotal/tax/total from the sum of line totals.
///
/// The meaning of `line_sum` depends on the mode: net of tax in
/// [`PricingMode::Exclusive`], gross of tax in [`PricingMode::Inclusive`].
/// In both modes the result satisfies `total == subtotal + tax` exactly.
///
/// ## Example
/// ```rust
/// use tally_core::money::{compute_totals, Money, PricingMode, TaxRate};
///
/// // Two lines: 10.00 × 2 and 5.00 × 1 at 15% VAT, prices net of tax
/// let t = compute_totals(Money::from_cents(2500), TaxRate::from_bps(1500), PricingMode::Exclusive);
/// assert_eq!((t.subtotal_cents, t.tax_cents, t.total_cents), (2500, 375, 2875));
///
/// // Same order with tax-inclusive prices summing to 28.75
/// let t = compute_totals(Money::from_cents(2875), TaxRate::from_bps(1500), PricingMode::Inclusive);
/// assert_eq!((t.subtotal_cents, t.tax_cents, t.total_cents), (2500, 375, 2875));
/// ```
pub fn compute_totals(line_sum: Money, rate: TaxRate, mode: PricingMode) -> Totals {
    match mode {
        PricingMode::Exclusive => {
            let tax = line_sum.tax_portion(rate);
            Totals {
                subtotal_cents: line_sum.cents(),
                tax_cents: tax.cents(),
                total_cents: (line_sum + tax).cents(),
            }
        }
        PricingMode::Inclusive => {
            let tax = line_sum.tax_within(rate);
            Totals {
                subtotal_cents: (line_sum - tax).cents(),
                tax_cents: tax.cents(),
                total_cents: line_sum.cents(),
            }
        }
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        let sum: Money = [a, b, b].into_iter().sum();
        assert_eq!(sum.cents(), 2000);
    }

    #[test]
    fn test_tax_portion_basic() {
        // 10.00 at 10% = 1.00
        let amount = Money::from_cents(1000);
        let rate = TaxRate::from_bps(1000);
        assert_eq!(amount.tax_portion(rate).cents(), 100);
    }

    #[test]
    fn test_tax_portion_with_rounding() {
        // 10.00 at 8.25% = 0.825 → 0.83 (half-up)
        let amount = Money::from_cents(1000);
        let rate = TaxRate::from_bps(825);
        assert_eq!(amount.tax_portion(rate).cents(), 83);
    }

    #[test]
    fn test_tax_within_exact() {
        // 28.75 gross at 15% contains exactly 3.75 of tax
        let gross = Money::from_cents(2875);
        let rate = TaxRate::from_bps(1500);
        assert_eq!(gross.tax_within(rate).cents(), 375);
    }

    #[test]
    fn test_exclusive_totals_scenario() {
        // [(10.00 × 2), (5.00 × 1)] at 15% → 25.00 / 3.75 / 28.75
        let line_sum = Money::from_cents(1000 * 2 + 500);
        let t = compute_totals(line_sum, TaxRate::from_bps(1500), PricingMode::Exclusive);
        assert_eq!(t.subtotal_cents, 2500);
        assert_eq!(t.tax_cents, 375);
        assert_eq!(t.total_cents, 2875);
    }

    #[test]
    fn test_inclusive_totals_scenario() {
        // 28.75 gross at 15% → tax 3.75, subtotal 25.00 (inverse of exclusive)
        let t = compute_totals(Money::from_cents(2875), TaxRate::from_bps(1500), PricingMode::Inclusive);
        assert_eq!(t.tax_cents, 375);
        assert_eq!(t.subtotal_cents, 2500);
        assert_eq!(t.total_cents, 2875);
    }

    #[test]
    fn test_totals_invariant_both_modes() {
        // total == subtotal + tax holds for awkward amounts in both modes
        for cents in [1, 99, 333, 1001, 99999, 1234567] {
            for bps in [0u32, 500, 825, 1500, 2000] {
                let rate = TaxRate::from_bps(bps);
                let ex = compute_totals(Money::from_cents(cents), rate, PricingMode::Exclusive);
                assert_eq!(ex.total_cents, ex.subtotal_cents + ex.tax_cents);

                let inc = compute_totals(Money::from_cents(cents), rate, PricingMode::Inclusive);
                assert_eq!(inc.total_cents, inc.subtotal_cents + inc.tax_cents);
            }
        }
    }

    #[test]
    fn test_modes_are_mutual_inverses() {
        // Feed the exclusive mode's total into the inclusive mode: the
        // base/tax split must come back out within a cent.
        for cents in [100, 999, 2500, 10000, 123456] {
            let rate = TaxRate::from_bps(1500);
            let ex = compute_totals(Money::from_cents(cents), rate, PricingMode::Exclusive);
            let inc = compute_totals(Money::from_cents(ex.total_cents), rate, PricingMode::Inclusive);
            assert!((inc.subtotal_cents - ex.subtotal_cents).abs() <= 1);
            assert!((inc.tax_cents - ex.tax_cents).abs() <= 1);
            assert_eq!(inc.total_cents, ex.total_cents);
        }
    }

    #[test]
    fn test_zero_rate() {
        let t = compute_totals(Money::from_cents(1000), TaxRate::zero(), PricingMode::Inclusive);
        assert_eq!(t.subtotal_cents, 1000);
        assert_eq!(t.tax_cents, 0);
        assert_eq!(t.total_cents, 1000);
    }

    #[test]
    fn test_tax_rate_conversions() {
        let rate = TaxRate::from_percentage(15.0);
        assert_eq!(rate.bps(), 1500);
        assert!((rate.percentage() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_formatted() {
        assert_eq!(Money::from_cents(2875).formatted("SAR "), "SAR 28.75");
        assert_eq!(Money::from_cents(5).formatted("$"), "$0.05");
    }
}
