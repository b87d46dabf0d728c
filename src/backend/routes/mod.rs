//! Routes Module
//!
//! HTTP route configuration.
//!
//! - **`router`** - Assembles all routes and the global layers
//! - **`user_routes`** - `/user/*` account endpoints
//! - **`post_routes`** - `/` and `/post/*` content endpoints

pub mod post_routes;
pub mod router;
pub mod user_routes;

pub use router::create_router;
