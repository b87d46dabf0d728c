//! Shared Module
//!
//! Types and helpers that do not depend on the HTTP server: input
//! validation and the error type it produces. The backend builds on these,
//! and nothing here touches the database or the network.
//!
//! # Module Structure
//!
//! ```text
//! shared/
//! ├── mod.rs         - Module exports
//! ├── error.rs       - SharedError (validation failures)
//! └── validation.rs  - Email, password, post, tag and comment validation
//! ```

pub mod error;
pub mod validation;

pub use error::SharedError;
