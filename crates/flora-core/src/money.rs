//! Fixed-point money amounts.
//!
//! The backend and older persisted carts carry prices as decimal strings
//! (`"10000"`, `"12500.50"`), sometimes as JSON numbers, and occasionally not
//! at all. [`Money`] is the single internal representation: an unsigned count
//! of minor units (1/100 of the currency unit).
//!
//! # Conversion boundary
//!
//! - [`Money::parse`] is strict and reports [`CoreError`] for anything that is
//!   not a non-negative decimal with an optional fractional part. Fractional
//!   digits beyond the second are truncated.
//! - [`Money::from_f64`] follows the same truncation rule, so `12.999` and
//!   `"12.999"` are the same amount.
//! - Deserialization is lenient: strings go through [`Money::parse_or_zero`],
//!   which also reads exponent forms such as `"1e3"`, numbers are converted
//!   directly, and `null` or non-numeric values become
//!   [`Money::ZERO`]. A single malformed price therefore counts as zero in a
//!   total instead of poisoning it.
//! - Serialization writes the canonical decimal string (see `Display`), which
//!   is what the persisted cart snapshot stores. [`serialize_as_number`] is
//!   available for request payloads that expect a JSON number.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Minor units per major currency unit.
pub const MINOR_PER_MAJOR: u64 = 100;

/// A non-negative amount of money in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units.
    pub const fn from_minor(minor: u64) -> Self {
        Money(minor)
    }

    /// Creates an amount from whole currency units, saturating on overflow.
    pub const fn from_major(major: u64) -> Self {
        Money(major.saturating_mul(MINOR_PER_MAJOR))
    }

    /// Returns the amount in minor units.
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Returns the whole-unit part of the amount.
    pub const fn major(self) -> u64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the fractional part of the amount in minor units.
    pub const fn fraction(self) -> u64 {
        self.0 % MINOR_PER_MAJOR
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parses a decimal price string such as `"10000"`, `"99.5"` or `".75"`.
    ///
    /// Surrounding whitespace is ignored. Signs, exponents and digit
    /// separators are rejected.
    pub fn parse(input: &str) -> Result<Money, CoreError> {
        let invalid = || CoreError::InvalidPrice {
            input: input.to_string(),
        };
        let overflow = || CoreError::PriceOverflow {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_units: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        let mut minor = 0u64;
        let mut scale = MINOR_PER_MAJOR / 10;
        for digit in frac.bytes().take(2) {
            minor += u64::from(digit - b'0') * scale;
            scale /= 10;
        }

        whole_units
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Money)
            .ok_or_else(overflow)
    }

    /// Parses a price, treating anything unparseable as zero.
    ///
    /// Inputs [`Money::parse`] rejects get a second chance as a float
    /// literal, so `"1e3"` is 1000.
    pub fn parse_or_zero(input: &str) -> Money {
        Money::parse(input)
            .ok()
            .or_else(|| input.trim().parse::<f64>().ok().and_then(Money::from_f64))
            .unwrap_or(Money::ZERO)
    }

    /// Converts a floating-point amount in major units.
    ///
    /// Goes through the shortest decimal form of `value`, so digits past the
    /// second fractional one are truncated exactly as in [`Money::parse`].
    /// Returns `None` for negative, non-finite or out-of-range values.
    pub fn from_f64(value: f64) -> Option<Money> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Money::parse(&value.to_string()).ok()
    }

    /// Multiplies a unit price by a quantity, saturating on overflow.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(u64::from(quantity)))
    }

    /// Formats the amount with `,` thousands separators, e.g. `"25,000"` or
    /// `"1,234.50"`.
    pub fn grouped(self) -> String {
        let digits = self.major().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        if self.fraction() != 0 {
            out.push_str(&format!(".{:02}", self.fraction()));
        }
        out
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fraction() == 0 {
            write!(f, "{}", self.major())
        } else {
            write!(f, "{}.{:02}", self.major(), self.fraction())
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Serializes a [`Money`] as a JSON number in major units.
///
/// Whole amounts are written as integers, others as floats. Use with
/// `#[serde(serialize_with = "flora_core::money::serialize_as_number")]`.
pub fn serialize_as_number<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
    if money.fraction() == 0 {
        serializer.serialize_u64(money.major())
    } else {
        serializer.serialize_f64(money.minor() as f64 / MINOR_PER_MAJOR as f64)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a price as a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Ok(Money::parse_or_zero(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money::from_major(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(u64::try_from(v).map(Money::from_major).unwrap_or(Money::ZERO))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_f64(v).unwrap_or(Money::ZERO))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Money, E> {
        Ok(Money::ZERO)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}
