//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored in data files as plain JSON numbers (`"price": 9.5`).
//! Older files sometimes carry them as strings (`"price": "9.50"`), so
//! deserialization accepts both; serialization always writes a number, an
//! integer when the amount is whole.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative product price in the store's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative amounts.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            None
        } else {
            Some(Self(amount))
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<u32> for Price {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = self.0.normalize();
        match amount.to_u64() {
            Some(whole) if amount.fract().is_zero() => serializer.serialize_u64(whole),
            _ => rust_decimal::serde::float::serialize(&amount, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            #[serde(with = "rust_decimal::serde::float")]
            Number(Decimal),
            #[serde(with = "rust_decimal::serde::str")]
            Text(Decimal),
        }

        let amount = match Raw::deserialize(deserializer)? {
            Raw::Number(d) | Raw::Text(d) => d,
        };
        Self::new(amount).ok_or_else(|| serde::de::Error::custom("price cannot be negative"))
    }
}
