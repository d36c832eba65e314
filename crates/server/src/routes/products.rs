//! Product route handlers.

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use jsonshop_core::{Product, ProductId, ProductInput};

use crate::error::Result;
use crate::extract::AppJson;
use crate::state::AppState;

/// File name offered to the browser for the CSV export.
pub const EXPORT_FILE_NAME: &str = "productsList.csv";

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// List products, optionally filtered by exact category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .db()
        .products()
        .get_all(query.category.as_deref())
        .await?;
    Ok(Json(products))
}

/// Create a product.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.db().products().create(input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Show a single product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.db().products().get_by_id(&id).await?))
}

/// Merge the supplied fields onto a product.
#[instrument(skip(state, input), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    AppJson(input): AppJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.db().products().update(&id, input).await?))
}

/// Delete a product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.db().products().delete(&id).await?;
    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Stream the catalog as a CSV attachment.
#[instrument(skip(state))]
pub async fn export_csv(State(state): State<AppState>) -> Result<Response> {
    let stream = state.db().products().export_csv().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
