//! # Money — Integer-Cent Amounts
//!
//! Budget line items, approved task values, the total project value, and draw
//! amounts are all [`Money`]. The representation is a signed count of cents.
//!
//! Parsing accepts the forms people type into a budget sheet (`"1,250.00"`,
//! `"$1250"`, `"1250.5"`) and rejects anything with more than two decimal
//! places instead of truncating it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A monetary amount in cents.
///
/// Serializes as a bare integer count of cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// Build an amount from a count of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build an amount from whole dollars, rejecting overflow.
    pub fn from_dollars(dollars: i64) -> Result<Self, ValidationError> {
        dollars
            .checked_mul(100)
            .map(Self)
            .ok_or_else(|| ValidationError::AmountOverflow(dollars.to_string()))
    }

    /// The amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Parse an amount string into cents.
    ///
    /// - `"10000"` → 1,000,000 cents
    /// - `"10000.5"` → 1,000,050 cents
    /// - `"$10,000.00"` → 1,000,000 cents
    /// - `"-12.30"` → -1,230 cents
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidAmount`] for empty input, stray characters,
    /// or more than two decimal places; [`ValidationError::AmountOverflow`]
    /// when the amount does not fit in `i64` cents.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidAmount(s.to_string());

        let mut rest = s.trim();
        let negative = rest.starts_with('-');
        if negative {
            rest = &rest[1..];
        }
        rest = rest.strip_prefix('$').unwrap_or(rest);

        let (whole, frac) = match rest.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (rest, None),
        };

        let whole = ungroup(whole).ok_or_else(invalid)?;
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let frac_cents = match frac {
            None => 0,
            Some(f) if f.is_empty() || f.len() > 2 => return Err(invalid()),
            Some(f) if !f.bytes().all(|b| b.is_ascii_digit()) => return Err(invalid()),
            Some(f) => {
                let digits: i64 = f.parse().map_err(|_| invalid())?;
                if f.len() == 1 {
                    digits * 10
                } else {
                    digits
                }
            }
        };

        let overflow = || ValidationError::AmountOverflow(s.to_string());
        let cents = whole
            .parse::<i64>()
            .map_err(|_| overflow())?
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac_cents))
            .ok_or_else(overflow)?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Render as `1234.56` with no currency symbol or grouping.
    pub fn to_plain_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Strip thousands separators. Commas must split the digits into groups of
/// three after a leading group of one to three.
fn ungroup(whole: &str) -> Option<String> {
    if !whole.contains(',') {
        return Some(whole.to_string());
    }
    let mut groups = whole.split(',');
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 {
        return None;
    }
    let mut out = lead.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

impl fmt::Display for Money {
    /// Renders as `$1,234.56` (`-$12.00` for negative amounts).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let digits = (abs / 100).to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::iter::Sum for Money {
    /// Saturating sum; a ledger never wraps around.
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

/// Serde adapter that writes [`Money`] as a decimal string (`"110000.00"`)
/// and reads anything [`Money::parse`] accepts, or a bare integer of whole
/// dollars.
///
/// Used for hand-edited files where cent integers would be error-prone.
///
/// ```ignore
/// #[serde(with = "cpm_core::money::decimal")]
/// pub total_project_value: Money,
/// ```
pub mod decimal {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_plain_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an amount such as \"110,000.00\" or 110000")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            let dollars = i64::try_from(v).map_err(E::custom)?;
            Money::from_dollars(dollars).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            Money::from_dollars(v).map_err(E::custom)
        }

        /// Unquoted decimals in YAML (`110000.50`). More than two decimal
        /// places is still an error.
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            self.visit_str(&v.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_dollars() {
        assert_eq!(Money::parse("10000").unwrap().cents(), 1_000_000);
    }

    #[test]
    fn parse_one_and_two_decimals() {
        assert_eq!(Money::parse("1234.5").unwrap().cents(), 123_450);
        assert_eq!(Money::parse("1234.56").unwrap().cents(), 123_456);
        assert_eq!(Money::parse("0.07").unwrap().cents(), 7);
    }

    #[test]
    fn parse_currency_symbol_and_grouping() {
        assert_eq!(Money::parse("$110,000.00").unwrap().cents(), 11_000_000);
        assert_eq!(Money::parse("  $44,000 ").unwrap().cents(), 4_400_000);
    }

    #[test]
    fn parse_negative() {
        assert_eq!(Money::parse("-12.30").unwrap().cents(), -1_230);
        assert_eq!(Money::parse("-$5").unwrap().cents(), -500);
    }

    #[test]
    fn parse_rejects_three_decimals() {
        assert!(matches!(
            Money::parse("1.005"),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "abc", "12.", ".50", "1.2x", "12 34", "--5", "$"] {
            assert!(Money::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(matches!(
            Money::parse("999999999999999999999"),
            Err(ValidationError::AmountOverflow(_))
        ));
        assert!(matches!(
            Money::parse("92233720368547759"),
            Err(ValidationError::AmountOverflow(_))
        ));
    }

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(99).to_string(), "$0.99");
        assert_eq!(Money::from_cents(123_456).to_string(), "$1,234.56");
        assert_eq!(Money::from_cents(11_000_000).to_string(), "$110,000.00");
        assert_eq!(Money::from_cents(10_000_000_000).to_string(), "$100,000,000.00");
        assert_eq!(Money::from_cents(-1_200).to_string(), "-$12.00");
    }

    #[test]
    fn plain_string() {
        assert_eq!(Money::from_cents(450).to_plain_string(), "4.50");
        assert_eq!(Money::from_cents(-5).to_plain_string(), "-0.05");
    }

    #[test]
    fn sum_saturates() {
        let total: Money = [Money::from_cents(i64::MAX), Money::from_cents(1)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn from_dollars_overflow() {
        assert!(Money::from_dollars(i64::MAX).is_err());
        assert_eq!(Money::from_dollars(110_000).unwrap().cents(), 11_000_000);
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Budget {
        #[serde(with = "decimal")]
        total: Money,
    }

    #[test]
    fn decimal_adapter_reads_strings_and_dollars() {
        let a: Budget = serde_json::from_str(r#"{"total":"110,000.00"}"#).unwrap();
        assert_eq!(a.total.cents(), 11_000_000);
        let b: Budget = serde_json::from_str(r#"{"total":110000}"#).unwrap();
        assert_eq!(b.total.cents(), 11_000_000);
        assert!(serde_json::from_str::<Budget>(r#"{"total":"1.001"}"#).is_err());
        assert!(serde_json::from_str::<Budget>(r#"{"total":1.005}"#).is_err());
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"total":"110000.00"}"#);
    }

    #[test]
    fn decimal_adapter_reads_unquoted_decimals() {
        let a: Budget = serde_json::from_str(r#"{"total":110000.50}"#).unwrap();
        assert_eq!(a.total.cents(), 11_000_050);
        let b: Budget = serde_json::from_str(r#"{"total":0.07}"#).unwrap();
        assert_eq!(b.total.cents(), 7);
        assert!(serde_json::from_str::<Budget>(r#"{"total":12.345}"#).is_err());
    }

    #[test]
    fn parse_requires_groups_of_three() {
        assert_eq!(Money::parse("1,234,567").unwrap().cents(), 123_456_700);
        assert_eq!(Money::parse("123,456.78").unwrap().cents(), 12_345_678);
        for bad in ["1,2,3", ",5", "1234,567", "1,23", "12,", "1,,234", "$,100"] {
            assert!(Money::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(4_400_000)).unwrap();
        assert_eq!(json, "4400000");
        let back: Money = serde_json::from_str("77").unwrap();
        assert_eq!(back, Money::from_cents(77));
    }
}
