//! Cart repository.
//!
//! Carts are pre-existing documents; this repository never creates one on
//! the fly. Quantity is represented by repeating a product id:
//! - `add_item` appends one occurrence
//! - `remove_item` drops every occurrence
//! - `get_expanded` returns one product per occurrence, in cart order

use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use jsonshop_core::{Cart, CartId, Product, ProductId};

use super::{Database, RepositoryError};

/// A cart with its product ids resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedCart {
    #[serde(rename = "_id")]
    pub id: CartId,
    /// One entry per occurrence in the cart; ids that no longer resolve are dropped.
    pub products: Vec<Product>,
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    db: &'a Database,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a cart by its ID, without expanding products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no cart has this ID.
    #[instrument(skip(self), fields(cart_id = %id))]
    pub async fn get(&self, id: &CartId) -> Result<Cart, RepositoryError> {
        let carts: Vec<Cart> = self.db.read(&self.db.paths().carts).await?;
        carts
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| RepositoryError::not_found("cart", id))
    }

    /// Append one unit of a product to a cart.
    ///
    /// The product id is not checked against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no cart has this ID.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        cart_id: &CartId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        self.db
            .modify(&self.db.paths().carts, |carts: &mut Vec<Cart>| {
                let cart = find_mut(carts, cart_id)?;
                cart.add(product_id);
                Ok(cart.clone())
            })
            .await
    }

    /// Remove every occurrence of a product from a cart.
    ///
    /// Removing a product the cart does not hold is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no cart has this ID.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Cart, RepositoryError> {
        self.db
            .modify(&self.db.paths().carts, |carts: &mut Vec<Cart>| {
                let cart = find_mut(carts, cart_id)?;
                let removed = cart.remove_all(product_id);
                tracing::debug!(removed, "Removed product from cart");
                Ok(cart.clone())
            })
            .await
    }

    /// Get a cart with each product id resolved to its product.
    ///
    /// Repeated ids yield repeated products. Ids missing from the catalog
    /// are silently skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no cart has this ID.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_expanded(&self, cart_id: &CartId) -> Result<ExpandedCart, RepositoryError> {
        let cart = self.get(cart_id).await?;
        let catalog = self.db.products().get_all(None).await?;
        let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();

        let products = cart
            .products
            .iter()
            .filter_map(|id| by_id.get(id).map(|p| (*p).clone()))
            .collect();

        Ok(ExpandedCart {
            id: cart.id,
            products,
        })
    }

    /// Insert a new cart document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a cart with the same ID exists.
    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn insert(&self, cart: Cart) -> Result<Cart, RepositoryError> {
        self.db
            .modify(&self.db.paths().carts, |carts: &mut Vec<Cart>| {
                if carts.iter().any(|c| c.id == cart.id) {
                    return Err(RepositoryError::Conflict(format!(
                        "cart {} already exists",
                        cart.id
                    )));
                }
                carts.push(cart.clone());
                Ok(cart)
            })
            .await
    }

    /// Delete every cart, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the collection cannot be rewritten.
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<usize, RepositoryError> {
        self.db
            .modify(&self.db.paths().carts, |carts: &mut Vec<Cart>| {
                let removed = carts.len();
                carts.clear();
                Ok(removed)
            })
            .await
    }
}

fn find_mut<'c>(carts: &'c mut [Cart], id: &CartId) -> Result<&'c mut Cart, RepositoryError> {
    carts
        .iter_mut()
        .find(|c| &c.id == id)
        .ok_or_else(|| RepositoryError::not_found("cart", id))
}
