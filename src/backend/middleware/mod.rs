//! Middleware Module
//!
//! Request gates that run before handlers.
//!
//! - **`auth`** - Session authentication (required and optional) and the
//!   admin role gate
//! - **`ownership`** - Extractor that loads a post and proves the caller owns it
//! - **`rate_limit`** - Sliding-window rate limiting
//!
//! # Ordering
//!
//! A request passes the rate limiter, then authentication, then the
//! ownership or role check, then the handler. Route-specific limiters are
//! layered inside `require_auth` so they key by user rather than address.

pub mod auth;
pub mod ownership;
pub mod rate_limit;

pub use auth::{
    identify, optional_auth, require_admin, require_auth, AuthUser, AuthenticatedUser, MaybeUser,
};
pub use ownership::OwnedPost;
pub use rate_limit::{rate_limit, RateLimitConfig, RateLimiter};
