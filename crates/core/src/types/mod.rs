//! Core types for Jsonshop.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod review;
pub mod timestamp;

pub use cart::Cart;
pub use id::*;
pub use price::Price;
pub use product::{Product, ProductInput, ProductName, ProductNameError};
pub use review::{Rating, RatingError, Review, ReviewInput, ReviewPatch};
