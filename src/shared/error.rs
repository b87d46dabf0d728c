//! Shared Error Types
//!
//! This module defines the input errors raised by the validation helpers in
//! [`crate::shared::validation`]. They carry no HTTP knowledge; the backend
//! converts them into `400 Bad Request` responses.
//!
//! # Usage
//!
//! ```rust
//! use ayu_blog::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "Email is invalid");
//! assert_eq!(error.to_string(), "Email is invalid");
//! ```
use thiserror::Error;

/// Input errors shared by every layer that accepts user data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    ///
    /// The display form is only the message, since it is shown to clients
    /// as-is.
    #[error("{message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::ValidationError { field, .. } => field,
        }
    }
}
