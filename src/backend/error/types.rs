/**
 * Backend Error Types
 *
 * This module defines the error taxonomy used by every handler, extractor
 * and middleware in the backend.
 *
 * # Error Categories
 *
 * - `ValidationError` - malformed or missing input (400)
 * - `Unauthenticated` - missing, invalid or expired session (401)
 * - `Forbidden` - valid identity without permission, or deactivated (403)
 * - `NotFound` - target resource absent (404)
 * - `Conflict` - duplicate verified email, lost verification race (409)
 * - `TooManyRequests` - rate limit exceeded (429)
 * - `InternalError` - unexpected failure (500)
 *
 * Failures are raised at the point of detection and short-circuit the
 * handler chain. Internal detail is logged by the response conversion and
 * never sent to the client.
 */

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Generic message returned for every 5xx response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use ayu_blog::backend::error::BackendError;
///
/// let err = BackendError::not_found("Post not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed or missing input
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// No usable session
    ///
    /// The message is generic; the precise reason (bad signature, expiry,
    /// malformed token) is logged where it is detected.
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// Authenticated, but not allowed to act
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Target resource does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Request collides with existing state
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Rate limit exceeded
    #[error("Too many requests: {message}")]
    TooManyRequests {
        message: String,
        /// Time until the oldest counted request leaves the window
        retry_after: Duration,
    },

    /// Unexpected failure; `detail` is for logs only
    #[error("Internal error: {detail}")]
    InternalError { detail: String },

    /// Input validation failure from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Store failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl BackendError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError { message: message.into() }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn too_many_requests(retry_after: Duration) -> Self {
        Self::TooManyRequests {
            message: "Too many requests. Please try again later".to_string(),
            retry_after,
        }
    }

    /// Create an internal error
    ///
    /// # Arguments
    ///
    /// * `detail` - Diagnostic text; logged, never returned to the client
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::InternalError { detail: detail.into() }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } | Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError { .. } | Self::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the client-facing message
    ///
    /// Internal and database errors collapse to [`INTERNAL_ERROR_MESSAGE`].
    pub fn message(&self) -> String {
        match self {
            Self::ValidationError { message }
            | Self::Unauthenticated { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::TooManyRequests { message, .. } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::InternalError { .. } | Self::DatabaseError(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }
}
