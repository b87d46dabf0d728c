//! Backend Error Module
//!
//! This module defines the error type returned by handlers, extractors and
//! middleware, and its conversion into JSON HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and status/message mapping
//! ├── conversion.rs - IntoResponse implementation
//! └── rejection.rs  - ApiJson body extractor
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ayu_blog::backend::error::BackendError;
//!
//! async fn handler() -> Result<&'static str, BackendError> {
//!     Err(BackendError::forbidden("Access denied"))
//! }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

/// JSON body extractor with `BackendError` rejections
pub mod rejection;

pub use rejection::ApiJson;
pub use types::{BackendError, INTERNAL_ERROR_MESSAGE};
