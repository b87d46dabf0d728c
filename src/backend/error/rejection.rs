/**
 * Request Body Extraction
 *
 * `ApiJson` behaves like `axum::Json` on the way in but rejects with a
 * [`BackendError`], so malformed or missing bodies get the same
 * `{"success": false, "message": ...}` shape as every other failure.
 */

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::backend::error::types::BackendError;

/// JSON request body with a JSON rejection
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                BackendError::validation(format!("Invalid request body: {}", rejection.body_text()))
            })?;
        Ok(Self(value))
    }
}
