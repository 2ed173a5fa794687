//! # Percentage — Exact Completion Ratios
//!
//! A [`Percentage`] is the ratio `numerator / denominator`, read as
//! `100 * numerator / denominator` percent. Completed-work percentages are
//! built straight from cent amounts, and milestone thresholds from basis
//! points, so comparing one against the other never involves floating point.
//!
//! ## Invariants
//!
//! - The denominator is always strictly positive. There is no `NaN` and no
//!   infinity; a ratio against a zero or negative whole is 0%.
//! - Equality and ordering are by cross-multiplication in `i128`, so
//!   `44_000 / 110_000 == 4_000 / 10_000`.
//! - Values above 100% are representable and are not clamped.
//! - For any whole number of basis points `t`, `x >= t` holds exactly when
//!   `x.basis_points() >= t`. Display rounding (always down) never changes
//!   the outcome of a threshold comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::money::Money;

const BASIS_POINTS_PER_UNIT: i128 = 10_000;

/// An exact percentage.
#[derive(Debug, Clone, Copy)]
pub struct Percentage {
    numerator: i64,
    denominator: i64,
}

impl Percentage {
    /// 0%.
    pub const ZERO: Percentage = Percentage {
        numerator: 0,
        denominator: 1,
    };

    /// 100%.
    pub const FULL: Percentage = Percentage {
        numerator: 1,
        denominator: 1,
    };

    /// `part / whole` as a percentage. A zero or negative `whole` yields 0%.
    pub fn ratio(part: Money, whole: Money) -> Self {
        if !whole.is_positive() {
            return Self::ZERO;
        }
        Self {
            numerator: part.cents(),
            denominator: whole.cents(),
        }
    }

    /// Build from basis points: 7000 bp is 70%.
    pub const fn from_basis_points(bp: u32) -> Self {
        Self {
            numerator: bp as i64,
            denominator: BASIS_POINTS_PER_UNIT as i64,
        }
    }

    /// Parse `"70"`, `"70.5"`, `"70.25"` or `"70.25%"`.
    ///
    /// At most two decimal places; negative values are rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidPercentage(s.to_string());
        let trimmed = s.trim();
        let body = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole.is_empty()
            || frac.len() > 2
            || (body.contains('.') && frac.is_empty())
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let frac: u32 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u32>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        let bp = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(invalid)?;
        Ok(Self::from_basis_points(bp))
    }

    /// Hundredths of a percent, rounded down.
    ///
    /// Saturates at the bounds of `i64` for absurd ratios.
    pub fn basis_points(&self) -> i64 {
        let scaled = (self.numerator as i128 * BASIS_POINTS_PER_UNIT)
            .div_euclid(self.denominator as i128);
        scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Approximate value in percent. For display only; never compare these.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 * 100.0 / self.denominator as f64
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Whether the ratio exceeds 100%.
    pub fn exceeds_full(&self) -> bool {
        *self > Self::FULL
    }

    /// Two-decimal rendering without the `%` sign, e.g. `70.00`.
    pub fn to_decimal_string(&self) -> String {
        let bp = self.basis_points();
        let sign = if bp < 0 { "-" } else { "" };
        let abs = bp.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl PartialEq for Percentage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Percentage {}

impl PartialOrd for Percentage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percentage {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_decimal_string())
    }
}

impl FromStr for Percentage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentageVisitor)
    }
}

struct PercentageVisitor;

impl<'de> Visitor<'de> for PercentageVisitor {
    type Value = Percentage;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a percentage such as \"70\", \"70.5\" or 70")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Percentage::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }
}
