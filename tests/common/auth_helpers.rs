//! Authentication test helpers
//!
//! Provides utilities for creating verified users, issuing their tokens
//! and building authorization headers.

use axum::http::HeaderValue;
use uuid::Uuid;

use ayu_blog::backend::auth::users::{create_verified_user, Role, User};
use ayu_blog::backend::server::AppState;

pub const TEST_PASSWORD: &str = "password123";

/// Test user credentials
pub struct TestUser {
    pub user: User,
    pub password: String,
    pub token: String,
}

/// Create a verified user directly in the store and sign it in
pub async fn create_test_user(state: &AppState, name: &str, email: &str, role: Role) -> TestUser {
    let hash = state
        .hasher
        .hash(TEST_PASSWORD)
        .await
        .expect("Failed to hash test password");
    let user = create_verified_user(&state.db, name, email, &hash, role)
        .await
        .expect("Failed to create test user");
    let token = state
        .tokens
        .issue(user.id, &user.email)
        .expect("Failed to issue test token");

    TestUser {
        user,
        password: TEST_PASSWORD.to_string(),
        token,
    }
}

/// Create an author with a unique email
pub async fn create_unique_test_user(state: &AppState) -> TestUser {
    let email = format!("test_{}@example.com", Uuid::new_v4().simple());
    create_test_user(state, "Test User", &email, Role::Author).await
}

/// Create authorization header value
pub fn auth_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("Token is not a valid header")
}
