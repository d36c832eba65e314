//! Product reviews.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::id::ReviewId;
use super::timestamp;

/// Errors that can occur when validating a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The rating is neither a number nor a numeric string.
    #[error("rate must be a number")]
    NotANumber,
    /// The rating falls outside the accepted range.
    #[error("rate must be between {min} and {max}")]
    OutOfRange {
        /// Lowest accepted rating.
        min: u8,
        /// Highest accepted rating.
        max: u8,
    },
}

/// A review rating from 1 to 5.
///
/// Data files hold ratings as JSON numbers, occasionally fractional
/// (`4.5`) or quoted (`"5"`). Both decode; a whole rating encodes as an
/// integer and a fractional one as a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(Decimal);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Validate a rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] unless `1 <= value <= 5`.
    pub fn new(value: Decimal) -> Result<Self, RatingError> {
        if value < Decimal::from(Self::MIN) || value > Decimal::from(Self::MAX) {
            return Err(RatingError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value.normalize()))
    }

    /// Validate a rating given as a JSON number or numeric string.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::NotANumber`] for any other JSON value, or
    /// [`RatingError::OutOfRange`] as [`Rating::new`].
    pub fn parse(value: &Value) -> Result<Self, RatingError> {
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_owned(),
            _ => return Err(RatingError::NotANumber),
        };
        let value = text
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| RatingError::NotANumber)?;
        Self::new(value)
    }

    /// Get the rating value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(Decimal::from(value))
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_u64() {
            Some(whole) if self.0.fract().is_zero() => serializer.serialize_u64(whole),
            _ => rust_decimal::serde::float::serialize(&self.0, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

/// A review nested inside its owning product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    #[serde(rename = "rate", alias = "rating")]
    pub rating: Rating,
    pub comment: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    /// Stored fields this type does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    /// Create a review with a creation timestamp and no update timestamp.
    #[must_use]
    pub fn new(id: ReviewId, rating: Rating, comment: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            rating,
            comment,
            created_at: now,
            updated_at: None,
            extra: Map::new(),
        }
    }
}

/// Client-supplied review fields, used for both create and update.
///
/// `rating` is kept as raw JSON so that type and range errors surface as
/// validation failures instead of body decoding failures. Both `rate` and
/// `rating` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default, alias = "rate", skip_serializing_if = "Option::is_none")]
    pub rating: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A validated partial review update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub rating: Option<Rating>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    /// Validate whichever fields are present in `input`.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] if a supplied rating is not a number in range.
    pub fn from_input(input: ReviewInput) -> Result<Self, RatingError> {
        Ok(Self {
            rating: input.rating.as_ref().map(Rating::parse).transpose()?,
            comment: input.comment,
        })
    }

    /// Apply the supplied fields onto `review` and stamp its update time.
    pub fn apply(self, review: &mut Review, now: DateTime<Utc>) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = self.comment {
            review.comment = comment;
        }
        review.updated_at = Some(now);
    }
}
