//! Posts Module
//!
//! Blog content: posts, likes and comments.
//!
//! - **`types`** - Stored records, read models, request/response bodies
//! - **`db`** - Database operations
//! - **`handlers`** - HTTP handlers
//!
//! Authorization is not repeated here. Routes wrap these handlers in the
//! auth middleware, and ownership checks happen in the `OwnedPost`
//! extractor before a handler runs.

pub mod db;
pub mod handlers;
pub mod types;

pub use types::{Post, PostResponse, PostWithOwner};
