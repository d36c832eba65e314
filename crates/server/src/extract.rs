//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
///
/// Same as [`axum::Json`], except that a missing, malformed or mistyped body
/// is rejected as [`AppError::BadRequest`], so clients get the usual
/// `{ "error": ... }` body with a 400 status.
///
/// # Example
///
/// ```rust,ignore
/// async fn create(AppJson(input): AppJson<ProductInput>) -> Result<Json<Product>> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
