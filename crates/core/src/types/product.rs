//! Product records and the input accepted when creating or updating them.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;
use super::review::Review;
use super::timestamp;

/// Errors that can occur when validating a [`ProductName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductNameError {
    /// No name was supplied.
    #[error("Insert a name please!")]
    Missing,
    /// The name is shorter than the minimum.
    #[error("short name: must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The name is longer than the maximum.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A validated product name.
///
/// ## Constraints
///
/// - Leading and trailing whitespace is trimmed
/// - Length after trimming: 4-200 characters
///
/// ## Examples
///
/// ```
/// use jsonshop_core::ProductName;
///
/// assert!(ProductName::parse("Espresso Cup").is_ok());
/// assert!(ProductName::parse("Cup").is_err());
/// assert!(ProductName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    /// Minimum number of characters.
    pub const MIN_LENGTH: usize = 4;
    /// Maximum number of characters.
    pub const MAX_LENGTH: usize = 200;

    /// Parse a `ProductName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is shorter than 4 or longer
    /// than 200 characters.
    pub fn parse(s: &str) -> Result<Self, ProductNameError> {
        let trimmed = s.trim();
        let len = trimmed.chars().count();

        if len < Self::MIN_LENGTH {
            return Err(ProductNameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if len > Self::MAX_LENGTH {
            return Err(ProductNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product document as stored in the products collection.
///
/// Field names follow the data files (`_id`, `createdAt`, `imageUrl`, ...).
/// Optional fields may be absent in older files and decode to `None`.
/// Fields not modelled here are kept in `extra` and written back as found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Build a new product from validated input.
    ///
    /// Both timestamps are set to `now` and the review list starts empty.
    #[must_use]
    pub fn new(id: ProductId, name: ProductName, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into_inner(),
            description: input.description,
            brand: input.brand,
            price: input.price,
            category: input.category,
            created_at: now,
            updated_at: now,
            image_url: input.image_url,
            reviews: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Merge the supplied fields of `input` onto this product.
    ///
    /// Fields absent from `input` are left unchanged. The id, creation
    /// timestamp and reviews are never touched.
    pub fn merge(&mut self, name: ProductName, input: ProductInput, now: DateTime<Utc>) {
        self.name = name.into_inner();
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(brand) = input.brand {
            self.brand = Some(brand);
        }
        if let Some(price) = input.price {
            self.price = Some(price);
        }
        if let Some(category) = input.category {
            self.category = Some(category);
        }
        if let Some(image_url) = input.image_url {
            self.image_url = Some(image_url);
        }
        self.updated_at = now;
    }

    /// Whether this product belongs to `category` (exact match).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }
}

/// Client-supplied product fields, used for both create and update.
///
/// Every field is optional at the wire level; `name` is enforced by
/// [`ProductInput::validated_name`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Validate the name field.
    ///
    /// # Errors
    ///
    /// Returns [`ProductNameError::Missing`] if no name was supplied, or the
    /// [`ProductName::parse`] error if it is out of bounds.
    pub fn validated_name(&self) -> Result<ProductName, ProductNameError> {
        let name = self.name.as_deref().ok_or(ProductNameError::Missing)?;
        ProductName::parse(name)
    }
}
