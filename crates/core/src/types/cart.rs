//! Shopping carts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{CartId, ProductId};

/// A cart document as stored in the carts collection.
///
/// Quantity is represented by repetition: a product id appearing twice
/// means two units. Ids are not checked against the product collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: CartId,
    #[serde(default)]
    pub products: Vec<ProductId>,
    /// Stored fields this type does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            products: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Append one unit of `product_id`.
    pub fn add(&mut self, product_id: ProductId) {
        self.products.push(product_id);
    }

    /// Remove every occurrence of `product_id`, returning how many were removed.
    pub fn remove_all(&mut self, product_id: &ProductId) -> usize {
        let before = self.products.len();
        self.products.retain(|id| id != product_id);
        before - self.products.len()
    }
}
