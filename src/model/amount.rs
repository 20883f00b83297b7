//! Amount type for monetary values reported by the finance sheet.
//!
//! The remote side is a spreadsheet script, so amounts arrive either as JSON numbers or as strings
//! that may carry thousands separators. `Amount` wraps `Decimal` and accepts both.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a monetary amount.
///
/// # Examples
///
/// ```
/// # use finsheet_sync::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1,250,000").unwrap();
/// assert_eq!(amount.to_string(), "1,250,000");
/// ```
///
/// Fractional amounts keep two decimal places when displayed:
/// ```
/// # use finsheet_sync::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-87.5").unwrap();
/// assert_eq!(amount.to_string(), "-87.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.is_zero()
    }

    /// Lossy conversion used when handing values to charting code.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    fn is_whole(&self) -> bool {
        self.0.fract().is_zero()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }
        let without_commas = trimmed.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().to_f64().unwrap_or_default();
        if self.is_whole() {
            write!(f, "{sign}{}", format_num::format_num!(",.0", num))
        } else {
            write!(f, "{sign}{}", format_num::format_num!(",.2", num))
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Whole amounts go out as integers so the sheet does not see "50000.0".
        match self.0.to_i64() {
            Some(i) if self.is_whole() => serializer.serialize_i64(i),
            _ => serializer.serialize_f64(self.to_f64()),
        }
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Decimal::try_from(v).map(Amount).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Amount::default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50000").unwrap();
        assert_eq!(amount.value(), Decimal::from(50000));
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str("1,234,567.89").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("1234567.89").unwrap());
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("  ").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("lots").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from(1_250_000).to_string(), "1,250,000");
        assert_eq!(Amount::from(-4_500).to_string(), "-4,500");
        assert_eq!(Amount::ZERO.to_string(), "0");
        let fractional = Amount::from_str("1234.5").unwrap();
        assert_eq!(fractional.to_string(), "1,234.50");
    }

    #[test]
    fn test_deserialize_number() {
        let amount: Amount = serde_json::from_str("1500000").unwrap();
        assert_eq!(amount, Amount::from(1_500_000));
        let amount: Amount = serde_json::from_str("12.25").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("12.25").unwrap());
    }

    #[test]
    fn test_deserialize_string() {
        let amount: Amount = serde_json::from_str("\"2,000\"").unwrap();
        assert_eq!(amount, Amount::from(2_000));
    }

    #[test]
    fn test_deserialize_null_is_zero() {
        let amount: Amount = serde_json::from_str("null").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_serialize_whole_as_integer() {
        let json = serde_json::to_string(&Amount::from(75_000)).unwrap();
        assert_eq!(json, "75000");
    }

    #[test]
    fn test_serialize_fraction() {
        let json = serde_json::to_string(&Amount::from_str("7.25").unwrap()).unwrap();
        assert_eq!(json, "7.25");
    }

    #[test]
    fn test_zero_is_not_negative() {
        assert!(!Amount::from_str("-0").unwrap().is_negative());
        assert!(Amount::from(-1).is_negative());
    }
}
