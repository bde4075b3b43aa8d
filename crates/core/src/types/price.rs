//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A price in the store's single currency.
///
/// The storefront API sends prices as JSON numbers on some endpoints and as
/// decimal strings on others; both deserialize. Prices always serialize as
/// decimal strings so no precision is lost in durable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in minor units (e.g. cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Decimal::try_from(v)
            .map(|d| Price(d.normalize()))
            .map_err(|_| E::custom(format!("invalid price: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse::<Price>()
            .map_err(|_| E::custom(format!("invalid price: {v:?}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_and_number() {
        let a: Price = serde_json::from_str("\"19.99\"").unwrap();
        let b: Price = serde_json::from_str("19.99").unwrap();
        let c: Price = serde_json::from_str("20").unwrap();
        assert_eq!(a, Price::from_minor(1999));
        assert_eq!(b, Price::from_minor(1999));
        assert_eq!(c, Price::from_minor(2000));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Price::from_minor(1050)).unwrap();
        assert_eq!(json, "\"10.50\"");
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_minor(500).to_string(), "5.00");
        assert_eq!("7".parse::<Price>().unwrap().to_string(), "7.00");
    }

    #[test]
    fn test_arithmetic() {
        let total: Price = [Price::from_minor(250) * 2, Price::from_minor(100)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_minor(600));
    }
}
