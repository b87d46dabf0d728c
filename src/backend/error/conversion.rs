/**
 * Error Conversion
 *
 * `IntoResponse` for [`BackendError`], so handlers, extractors and
 * middleware can return it directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "success": false,
 *   "message": "Post not found"
 * }
 * ```
 *
 * 429 responses also carry `Retry-After` (whole seconds, rounded up).
 */

use axum::{
    http::{header::RETRY_AFTER, HeaderValue},
    response::{IntoResponse, Json, Response},
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body = serde_json::json!({
            "success": false,
            "message": self.message(),
        });
        let mut response = (status, Json(body)).into_response();

        if let BackendError::TooManyRequests { retry_after, .. } = &self {
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = BackendError::not_found("Post not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Post not found");
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response = BackendError::internal("disk full on /var/lib/db").into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let response =
            BackendError::too_many_requests(Duration::from_millis(1500)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "2");
    }
}
