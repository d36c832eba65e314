//! Review route handlers, nested under a product.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use jsonshop_core::{ProductId, Review, ReviewId, ReviewInput};

use crate::error::Result;
use crate::extract::AppJson;
use crate::state::AppState;

/// List a product's reviews.
#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.db().products().list_reviews(&product_id).await?))
}

/// Add a review; responds with the product's full review list.
#[instrument(skip(state, input), fields(product_id = %product_id))]
pub async fn create(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    AppJson(input): AppJson<ReviewInput>,
) -> Result<(StatusCode, Json<Vec<Review>>)> {
    let reviews = state
        .db()
        .products()
        .add_review(&product_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(reviews)))
}

/// Show one review.
#[instrument(skip(state), fields(product_id = %product_id, review_id = %review_id))]
pub async fn show(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<Json<Review>> {
    let review = state
        .db()
        .products()
        .get_review(&product_id, &review_id)
        .await?;
    Ok(Json(review))
}

/// Merge the supplied fields onto a review.
#[instrument(skip(state, input), fields(product_id = %product_id, review_id = %review_id))]
pub async fn update(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
    AppJson(input): AppJson<ReviewInput>,
) -> Result<Json<Vec<Review>>> {
    let reviews = state
        .db()
        .products()
        .update_review(&product_id, &review_id, input)
        .await?;
    Ok(Json(reviews))
}

/// Delete a review; responds with the remaining reviews.
#[instrument(skip(state), fields(product_id = %product_id, review_id = %review_id))]
pub async fn destroy(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<Json<Vec<Review>>> {
    let reviews = state
        .db()
        .products()
        .delete_review(&product_id, &review_id)
        .await?;
    Ok(Json(reviews))
}
