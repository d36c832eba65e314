//! Cart route handlers.
//!
//! Carts must already exist; adding to an unknown cart is a 404.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use jsonshop_core::{Cart, CartId, ProductId};

use crate::db::ExpandedCart;
use crate::error::Result;
use crate::state::AppState;

/// Show a cart with its products expanded.
#[instrument(skip(state), fields(cart_id = %cart_id))]
pub async fn show(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<Json<ExpandedCart>> {
    Ok(Json(state.db().carts().get_expanded(&cart_id).await?))
}

/// Add one unit of a product.
#[instrument(skip(state), fields(cart_id = %cart_id, product_id = %product_id))]
pub async fn add(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
) -> Result<Json<Cart>> {
    Ok(Json(state.db().carts().add_item(&cart_id, product_id).await?))
}

/// Remove every unit of a product.
#[instrument(skip(state), fields(cart_id = %cart_id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
) -> Result<Json<Cart>> {
    Ok(Json(
        state
            .db()
            .carts()
            .remove_item(&cart_id, &product_id)
            .await?,
    ))
}
