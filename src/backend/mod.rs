//! Backend Module
//!
//! All server-side code: a complete Axum HTTP server over a SQLite store.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`auth`** - Accounts, verification codes, sessions, authorization rules
//! - **`posts`** - Posts, likes and comments
//! - **`middleware`** - Authentication, ownership and rate limiting gates
//! - **`error`** - Backend error type and its JSON responses
//!
//! # Request Pipeline
//!
//! Rate limiter → authentication → ownership/role check → handler → store.
//!
//! # Thread Safety
//!
//! Handlers run on the multi-threaded Tokio runtime. Shared state is either
//! immutable after startup (`Arc<AppConfig>`, `Arc<TokenIssuer>`), a pool
//! handle, or guarded by a mutex (rate-limit windows).

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// Posts, likes and comments
pub mod posts;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use server::{create_app, AppConfig, AppState};
