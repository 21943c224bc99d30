//! # Money Module
//!
//! Provides the `Money` type for card balances and fares.
//!
//! ## Why Integer Pence?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floats:                                                    │
//! │    30.0 - 3.20 + 0.70 = 27.499999999999996  ❌ WRONG!                   │
//! │                                                                         │
//! │  Every tap charges a hold and refunds part of it. Thousands of         │
//! │  hold/refund cycles would drift the balance by fractions of a penny.   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Pence                                            │
//! │    3000 - 320 + 70 = 2750 pence = £27.50 exactly                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use oyster_core::money::Money;
//!
//! let max_fare = Money::from_pence(320);           // £3.20
//! let fare = Money::from_pounds_pence(2, 50);      // £2.50
//! assert_eq!((max_fare - fare).pence(), 70);
//!
//! let parsed = Money::parse("25.70").unwrap();
//! assert_eq!(parsed.pence(), 2570);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in pence (the smallest sterling unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: penalties may drive a balance below zero
/// - **Transparent serde**: serialized as the raw pence integer
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  load_balance ──► Account.balance ◄── swipe_in (hold: -max fare)       │
/// │                         ▲                                               │
/// │                         ├── swipe_out (refund: max fare - fare)        │
/// │                         ├── penalties (-max fare)                      │
/// │                         └── take_bus (-bus fare)                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from pence.
    ///
    /// ## Example
    /// ```rust
    /// use oyster_core::money::Money;
    ///
    /// let fare = Money::from_pence(250);
    /// assert_eq!(fare.to_string(), "£2.50");
    /// ```
    #[inline]
    pub const fn from_pence(pence: i64) -> Self {
        Money(pence)
    }

    /// Creates a Money value from pounds and pence.
    ///
    /// For negative amounts only the pounds should be negative:
    /// `from_pounds_pence(-3, 20)` is -£3.20.
    #[inline]
    pub const fn from_pounds_pence(pounds: i64, pence: i64) -> Self {
        if pounds < 0 {
            Money(pounds * 100 - pence)
        } else {
            Money(pounds * 100 + pence)
        }
    }

    /// Parses a decimal pound amount such as `"2.50"`, `"30"` or `"£1.80"`.
    ///
    /// At most two fractional digits are accepted; anything finer cannot be
    /// represented without rounding and is rejected.
    ///
    /// ## Example
    /// ```rust
    /// use oyster_core::money::Money;
    ///
    /// assert_eq!(Money::parse("30").unwrap().pence(), 3000);
    /// assert_eq!(Money::parse("£1.8").unwrap().pence(), 180);
    /// assert_eq!(Money::parse("-3.20").unwrap().pence(), -320);
    /// assert!(Money::parse("1.234").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('£').unwrap_or(rest);

        if rest.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (whole, frac) = match rest.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (rest, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal point"));
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected at most two decimal digits"));
        }

        let pounds: i64 = whole
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let pence: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad pence"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad pence"))?,
        };

        let total = pounds
            .checked_mul(100)
            .and_then(|p| p.checked_add(pence))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }

    /// Returns the value in pence.
    #[inline]
    pub const fn pence(&self) -> i64 {
        self.0
    }

    /// Returns the whole pounds portion.
    #[inline]
    pub const fn pounds(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the pence portion (always 0-99).
    #[inline]
    pub const fn pence_part(&self) -> i64 {
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

    /// Returns the absolute value, saturating at the largest amount.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Adds, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(pence) => Some(Money(pence)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as sterling, e.g. `£27.50` or `-£3.20`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let pence = self.0.unsigned_abs();
        write!(f, "{}£{}.{:02}", sign, pence / 100, pence % 100)
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pence() {
        let money = Money::from_pence(2750);
        assert_eq!(money.pence(), 2750);
        assert_eq!(money.pounds(), 27);
        assert_eq!(money.pence_part(), 50);
    }

    #[test]
    fn test_from_pounds_pence() {
        assert_eq!(Money::from_pounds_pence(3, 20).pence(), 320);
        assert_eq!(Money::from_pounds_pence(-3, 20).pence(), -320);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_pence(2570).to_string(), "£25.70");
        assert_eq!(Money::from_pence(5).to_string(), "£0.05");
        assert_eq!(Money::from_pence(-320).to_string(), "-£3.20");
        assert_eq!(Money::zero().to_string(), "£0.00");
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        let min = Money::from_pence(i64::MIN);
        assert_eq!(min.to_string(), "-£92233720368547758.08");
        assert_eq!(min.abs().pence(), i64::MAX);

        let max = Money::from_pence(i64::MAX);
        assert_eq!(max.checked_add(Money::from_pence(1)), None);
        assert_eq!(
            Money::from_pence(250).checked_add(Money::from_pence(70)),
            Some(Money::from_pence(320))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("2.50").unwrap(), Money::from_pence(250));
        assert_eq!(Money::parse(" 30 ").unwrap(), Money::from_pence(3000));
        assert_eq!(Money::parse("£1.8").unwrap(), Money::from_pence(180));
        assert_eq!(Money::parse("-£0.40").unwrap(), Money::from_pence(-40));

        assert!(Money::parse("").is_err());
        assert!(Money::parse("£").is_err());
        assert!(Money::parse(".50").is_err());
        assert!(Money::parse("2.505").is_err());
        assert!(Money::parse("two").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pence(3000);
        let b = Money::from_pence(320);

        assert_eq!((a - b).pence(), 2680);
        assert_eq!((a + b).pence(), 3320);
        assert_eq!((-b).pence(), -320);

        let mut balance = a;
        balance -= b;
        balance += Money::from_pence(70);
        assert_eq!(balance.pence(), 2750);
    }

    /// Repeated hold/refund cycles must not drift.
    #[test]
    fn test_hold_refund_cycles_are_exact() {
        let mut balance = Money::from_pence(100_000);
        for _ in 0..10_000 {
            balance -= Money::from_pence(320);
            balance += Money::from_pence(70);
        }
        assert_eq!(balance.pence(), 100_000 - 10_000 * 250);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Money::from_pence(180)).unwrap();
        assert_eq!(json, "180");
        let back: Money = serde_json::from_str("320").unwrap();
        assert_eq!(back, Money::from_pence(320));
    }
}
