//! Database test fixtures
//!
//! Every test gets its own migrated in-memory SQLite database, so tests
//! never share rows and need no cleanup.

use sqlx::SqlitePool;

use ayu_blog::backend::server::config::connect_in_memory;

/// Create a migrated in-memory pool
pub async fn create_test_pool() -> SqlitePool {
    connect_in_memory()
        .await
        .expect("Failed to create in-memory test database")
}

/// Count rows in `users` registered under `email`
pub async fn count_users_with_email(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("Failed to count users")
}
