//! Common test utilities and helpers
//!
//! This module provides shared utilities for the API tests including:
//! - In-memory database fixtures
//! - A test server wired to a capturing mailer
//! - A stub identity provider
//! - Account and token helpers
//! - Response assertions

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod database;
pub mod identity;
pub mod mailer;
pub mod server;

pub use assertions::*;
pub use auth_helpers::*;
pub use database::*;
pub use identity::*;
pub use mailer::*;
pub use server::*;
