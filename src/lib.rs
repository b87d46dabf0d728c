//! Ayu Blog - Main Library
//!
//! Backend of a blogging application: accounts with email verification,
//! stateless sessions, posts with tags, likes and comments, ownership and
//! role checks, and rate limiting.
//!
//! # Module Structure
//!
//! - **`shared`** - Transport-agnostic input validation and error types
//!
//! - **`backend`** - The Axum HTTP server
//!   - Account flows (signup, verify, login, password reset)
//!   - Session tokens and the authentication middleware
//!   - Post, like and comment handlers
//!   - SQLite persistence
//!
//! # Usage
//!
//! ```rust,no_run
//! use ayu_blog::backend::server::{create_app, AppConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(AppConfig::from_env()).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Validation and errors shared by every layer
pub mod shared;

/// Server-side code
pub mod backend;
