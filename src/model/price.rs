//! Fixed-point money values.
//!
//! The store keeps `Price` as `DECIMAL(10,2)`, so values are held as whole
//! cents. Range checks and sums stay exact; only means go through `f64`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a price from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("price is empty")]
    Empty,
    #[error("price '{0}' is negative")]
    Negative(String),
    #[error("price '{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("price '{0}' is not a number")]
    Invalid(String),
    #[error("price '{0}' exceeds {max}", max = Price::MAX)]
    TooLarge(String),
}

/// A non-negative amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);
    /// Largest value a `DECIMAL(10,2)` column holds: 99,999,999.99.
    pub const MAX: Price = Price(9_999_999_999);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a floating point amount read from the store, rounding to the
    /// nearest cent. `None` for NaN, infinities, negatives and anything above
    /// [`Price::MAX`].
    pub fn from_f64(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents < 0.0 || cents > Self::MAX.0 as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceParseError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(PriceParseError::Negative(trimmed.to_string()));
        }
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if frac.len() > 2 {
            return Err(PriceParseError::TooPrecise(trimmed.to_string()));
        }
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(PriceParseError::Invalid(trimmed.to_string()));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| PriceParseError::Invalid(trimmed.to_string()))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .filter(|c| *c <= Self::MAX.0)
            .map(Price)
            .ok_or_else(|| PriceParseError::TooLarge(trimmed.to_string()))
    }
}

// Prices serialize as JSON numbers (45.0), matching what the store returns.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Price::from_f64(value).ok_or_else(|| {
            serde::de::Error::custom(format!("price {value} outside 0.00..={}", Price::MAX))
        })
    }
}
