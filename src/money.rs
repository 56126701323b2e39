//! Fixed-point money. Ledger and rake arithmetic must never touch floats:
//! everything here is integer cents under the hood.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount with exactly 2 fractional digits of significance, stored as signed cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("malformed amount: {0}")]
    Malformed(String),
    #[error("amount overflowed")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Scale by a rational numerator/denominator, rounding half-away-from-zero
    /// to the nearest cent (used for rake percentages).
    pub fn mul_rate_round(self, numerator: i64, denominator: i64) -> Money {
        debug_assert!(denominator > 0);
        let product = self.0 as i128 * numerator as i128;
        let half = denominator as i128 / 2;
        let rounded = if product >= 0 {
            (product + half) / denominator as i128
        } else {
            (product - half) / denominator as i128
        };
        Money(rounded as i64)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, rest) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let mut parts = rest.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let frac = parts.next().unwrap_or("0");
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Malformed(s.to_string()));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Malformed(s.to_string()));
        }
        let whole: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::Overflow)? * 10,
            _ => frac.parse().map_err(|_| MoneyError::Overflow)?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or(MoneyError::Overflow)?;
        Ok(Money(sign * cents))
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Supported settlement currencies. Each agent carries a balance per currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Primary,
    Stable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_displays_round_trip() {
        for s in ["1.00", "0.01", "-3.50", "120.00", "0.00"] {
            let m: Money = s.parse().unwrap();
            assert_eq!(m.to_string(), s);
        }
    }

    #[test]
    fn rejects_more_than_two_fractional_digits() {
        assert!("1.234".parse::<Money>().is_err());
    }

    #[test]
    fn rake_rounds_half_away_from_zero() {
        // 4% of 1.00 = 0.04 exactly
        let stake = Money::from_cents(100);
        assert_eq!(stake.mul_rate_round(4, 100), Money::from_cents(4));
        // 5% of 0.15 = 0.0075 -> rounds to 0.01 (half away from zero)
        let small = Money::from_cents(15);
        assert_eq!(small.mul_rate_round(5, 100), Money::from_cents(1));
        // negative amounts round away from zero too
        let neg = Money::from_cents(-15);
        assert_eq!(neg.mul_rate_round(5, 100), Money::from_cents(-1));
    }

    proptest! {
        /// Round-trip and idempotence: displaying then re-parsing any
        /// amount of cents must reproduce the original value exactly.
        #[test]
        fn display_then_parse_round_trips(cents in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_cents(cents);
            let parsed: Money = m.to_string().parse().unwrap();
            prop_assert_eq!(parsed, m);
        }
    }
}
