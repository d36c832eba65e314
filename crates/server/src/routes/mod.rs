//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                        - Liveness
//! GET    /health/ready                                  - Readiness (collections load)
//!
//! # Products
//! GET    /products?category=                            - Product listing
//! POST   /products                                      - Create product
//! GET    /products/export/exportToCSV                   - CSV download
//! GET    /products/{id}                                 - Product detail
//! PUT    /products/{id}                                 - Partial update
//! DELETE /products/{id}                                 - Delete product
//!
//! # Reviews
//! GET    /products/{id}/reviews                         - Review listing
//! POST   /products/{id}/reviews                         - Add review
//! GET    /products/{id}/reviews/{review_id}             - Review detail
//! PUT    /products/{id}/reviews/{review_id}             - Partial update
//! DELETE /products/{id}/reviews/{review_id}             - Delete review
//!
//! # Carts
//! GET    /carts/{cart_id}                               - Expanded cart
//! POST   /carts/{cart_id}/add-to-cart/{product_id}      - Add one unit
//! DELETE /carts/{cart_id}/remove-from-cart/{product_id} - Remove all units
//! ```
//!
//! Any other path answers 404 with a JSON `{ "error": ... }` body.

pub mod carts;
pub mod health;
pub mod products;
pub mod reviews;

use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product and review routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/export/exportToCSV", get(products::export_csv))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/reviews", get(reviews::index).post(reviews::create))
        .route(
            "/{id}/reviews/{review_id}",
            get(reviews::show)
                .put(reviews::update)
                .delete(reviews::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/{cart_id}", get(carts::show))
        .route("/{cart_id}/add-to-cart/{product_id}", post(carts::add))
        .route(
            "/{cart_id}/remove-from-cart/{product_id}",
            delete(carts::remove),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/carts", cart_routes())
        .fallback(route_not_found)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("route not found".to_string())
}

/// Build the full application: routes, middleware and state.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
