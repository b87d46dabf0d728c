/**
 * User Model and Credential Store
 *
 * This module holds the user record and every database operation on it.
 * Functions take a pool (or connection) and return `sqlx::Error`; callers
 * decide which failures are client errors.
 *
 * # Uniqueness
 *
 * `users.email` is UNIQUE and always stores the normalized address. A
 * signup for an email with a pending record refreshes that record in one
 * atomic upsert, so concurrent attempts can never leave two records.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Columns selected for every `User` query
const USER_COLUMNS: &str = "id, name, email, password_hash, account_verified, \
    verification_code, verification_code_expire, reset_password_token, \
    reset_password_expire, bio, profile_image_url, role, status, created_at, updated_at";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Author,
    Admin,
    Subscriber,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Admin => "admin",
            Self::Subscriber => "subscriber",
        }
    }
}

/// Administrative account status, independent of email verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Banned,
}

impl UserStatus {
    /// Inactive and banned accounts may not act, whatever their token says
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Inactive | Self::Banned)
    }
}

/// User record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Normalized email
    pub email: String,
    /// bcrypt hash; `None` for accounts that never set a password
    pub password_hash: Option<String>,
    pub account_verified: bool,
    pub verification_code: Option<i64>,
    pub verification_code_expire: Option<DateTime<Utc>>,
    /// SHA-256 (hex) of the outstanding reset token
    pub reset_password_token: Option<String>,
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub bio: String,
    pub profile_image_url: String,
    pub role: Role,
    pub status: Option<UserStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status.is_some_and(UserStatus::is_blocked)
    }
}

/// Insert a pending user, or refresh the pending user for that email
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `name` - Display name (already validated)
/// * `email` - Normalized email
/// * `password_hash` - bcrypt hash of the chosen password
///
/// # Returns
/// The pending record, or `None` if a verified account owns the email
pub async fn upsert_pending_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    let query = format!(
        r#"
        INSERT INTO users (id, name, email, password_hash, account_verified, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 0, $5, $5)
        ON CONFLICT(email) DO UPDATE SET
            name = excluded.name,
            password_hash = excluded.password_hash,
            verification_code = NULL,
            verification_code_expire = NULL,
            updated_at = excluded.updated_at
        WHERE users.account_verified = 0
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
}

/// Find or create the account for an identity-provider sign-in
///
/// The provider has proven the email, so the account ends up verified. A
/// new account gets no password. A pending account is verified and its
/// unproven password and code are dropped, so whoever started that signup
/// cannot sign in with them. A verified account is returned unchanged.
pub async fn upsert_federated_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let query = format!(
        r#"
        INSERT INTO users (id, name, email, password_hash, account_verified, created_at, updated_at)
        VALUES ($1, $2, $3, NULL, 1, $4, $4)
        ON CONFLICT(email) DO UPDATE SET
            password_hash = CASE WHEN users.account_verified = 1
                THEN users.password_hash ELSE NULL END,
            verification_code = CASE WHEN users.account_verified = 1
                THEN users.verification_code ELSE NULL END,
            verification_code_expire = CASE WHEN users.account_verified = 1
                THEN users.verification_code_expire ELSE NULL END,
            updated_at = CASE WHEN users.account_verified = 1
                THEN users.updated_at ELSE excluded.updated_at END,
            account_verified = 1
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(now)
        .fetch_one(pool)
        .await
}

/// Insert a user that is verified from the start
///
/// Used for seeding accounts (administrators, fixtures) outside the
/// signup flow.
pub async fn create_verified_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let query = format!(
        r#"
        INSERT INTO users (id, name, email, password_hash, account_verified, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 1, $5, $6, $6)
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .fetch_one(pool)
        .await
}

/// Get user by normalized email
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Get a verified user by normalized email
pub async fn get_verified_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND account_verified = 1"
    );
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Get user by ID
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Store a fresh verification code and its expiry
pub async fn set_verification_code(
    pool: &SqlitePool,
    id: Uuid,
    code: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET verification_code = $1, verification_code_expire = $2, updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(code)
    .bind(expires_at)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear a consumed or expired verification code
pub async fn clear_verification_code(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET verification_code = NULL, verification_code_expire = NULL, updated_at = $1
        WHERE id = $2
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Promote a pending user to verified, consuming its code
///
/// The update only applies while the account is still pending and still
/// holds `code`, so of two concurrent verifications exactly one succeeds.
///
/// # Returns
/// The verified user, or `None` if the conditional update matched nothing
pub async fn mark_verified(
    pool: &SqlitePool,
    id: Uuid,
    code: i64,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET account_verified = 1,
            verification_code = NULL,
            verification_code_expire = NULL,
            updated_at = $1
        WHERE id = $2 AND account_verified = 0 AND verification_code = $3
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(Utc::now())
        .bind(id)
        .bind(code)
        .fetch_optional(pool)
        .await
}

/// Delete every unverified record for `email` other than `keep`
///
/// # Returns
/// Number of records removed
pub async fn delete_pending_siblings(
    pool: &SqlitePool,
    email: &str,
    keep: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM users WHERE email = $1 AND id != $2 AND account_verified = 0",
    )
    .bind(email)
    .bind(keep)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Profile fields a user may change about themselves
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Apply a profile update; absent fields keep their value
pub async fn update_profile(
    pool: &SqlitePool,
    id: Uuid,
    update: &ProfileUpdate,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            bio = COALESCE($2, bio),
            profile_image_url = COALESCE($3, profile_image_url),
            updated_at = $4
        WHERE id = $5
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(update.name.as_deref())
        .bind(update.bio.as_deref())
        .bind(update.profile_image_url.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Set the account status (admin operation)
pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: UserStatus,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        "UPDATE users SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Store the hash of an outstanding password reset token
pub async fn set_reset_token(
    pool: &SqlitePool,
    id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = $1, reset_password_expire = $2, updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(token_hash)
    .bind(expires_at)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Drop an outstanding reset token
pub async fn clear_reset_token(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Find the user holding a reset token hash
pub async fn get_user_by_reset_token(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE reset_password_token = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

/// Replace the password hash and clear any reset token
pub async fn update_password(
    pool: &SqlitePool,
    id: Uuid,
    password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET password_hash = $1,
            reset_password_token = NULL,
            reset_password_expire = NULL,
            updated_at = $2
        WHERE id = $3
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::server::config::connect_in_memory;

    #[tokio::test]
    async fn test_upsert_creates_pending_user() {
        let pool = connect_in_memory().await.unwrap();

        let user = upsert_pending_user(&pool, "Alice", "alice@x.com", "hash1")
            .await
            .unwrap()
            .expect("pending user");

        assert_eq!(user.name, "Alice");
        assert!(!user.account_verified);
        assert_eq!(user.role, Role::Author);
        assert_eq!(user.status, None);
        assert_eq!(user.bio, "");
    }

    #[tokio::test]
    async fn test_upsert_refreshes_pending_user() {
        let pool = connect_in_memory().await.unwrap();

        let first = upsert_pending_user(&pool, "Alice", "alice@x.com", "hash1")
            .await
            .unwrap()
            .unwrap();
        let second = upsert_pending_user(&pool, "Alicia", "alice@x.com", "hash2")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Alicia");
        assert_eq!(second.password_hash.as_deref(), Some("hash2"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_refuses_verified_email() {
        let pool = connect_in_memory().await.unwrap();
        create_verified_user(&pool, "Alice", "alice@x.com", "hash", Role::Author)
            .await
            .unwrap();

        let result = upsert_pending_user(&pool, "Mallory", "alice@x.com", "other")
            .await
            .unwrap();
        assert!(result.is_none());

        let stored = get_user_by_email(&pool, "alice@x.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");
        assert_eq!(stored.password_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn test_mark_verified_requires_matching_code() {
        let pool = connect_in_memory().await.unwrap();
        let user = upsert_pending_user(&pool, "Alice", "alice@x.com", "hash")
            .await
            .unwrap()
            .unwrap();
        set_verification_code(&pool, user.id, 12345, Utc::now()).await.unwrap();

        assert!(mark_verified(&pool, user.id, 54321).await.unwrap().is_none());

        let verified = mark_verified(&pool, user.id, 12345).await.unwrap().unwrap();
        assert!(verified.account_verified);
        assert_eq!(verified.verification_code, None);
        assert_eq!(verified.verification_code_expire, None);

        // The code is single-use.
        assert!(mark_verified(&pool, user.id, 12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_absent_fields() {
        let pool = connect_in_memory().await.unwrap();
        let user = create_verified_user(&pool, "Alice", "alice@x.com", "hash", Role::Author)
            .await
            .unwrap();

        let update = ProfileUpdate {
            bio: Some("Writes about Rust".to_string()),
            ..Default::default()
        };
        let updated = update_profile(&pool, user.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.bio, "Writes about Rust");
        assert_eq!(updated.profile_image_url, user.profile_image_url);
    }

    #[tokio::test]
    async fn test_upsert_federated_user_creates_verified_account() {
        let pool = connect_in_memory().await.unwrap();
        let user = upsert_federated_user(&pool, "Grace", "grace@x.com").await.unwrap();

        assert!(user.account_verified);
        assert_eq!(user.name, "Grace");
        assert!(user.password_hash.is_none());
        assert_eq!(user.role, Role::Author);

        let again = upsert_federated_user(&pool, "Other Name", "grace@x.com").await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.name, "Grace");
    }

    #[tokio::test]
    async fn test_upsert_federated_user_takes_over_pending_signup() {
        let pool = connect_in_memory().await.unwrap();
        let pending = upsert_pending_user(&pool, "Squatter", "grace@x.com", "hash")
            .await
            .unwrap()
            .unwrap();

        let user = upsert_federated_user(&pool, "Grace", "grace@x.com").await.unwrap();
        assert_eq!(user.id, pending.id);
        assert!(user.account_verified);
        assert!(user.password_hash.is_none());
        assert!(user.verification_code.is_none());
    }

    #[tokio::test]
    async fn test_upsert_federated_user_keeps_verified_password() {
        let pool = connect_in_memory().await.unwrap();
        let existing = create_verified_user(&pool, "Grace", "grace@x.com", "hash", Role::Admin)
            .await
            .unwrap();

        let user = upsert_federated_user(&pool, "G", "grace@x.com").await.unwrap();
        assert_eq!(user.id, existing.id);
        assert_eq!(user.password_hash.as_deref(), Some("hash"));
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_update_status_blocks_user() {
        let pool = connect_in_memory().await.unwrap();
        let user = create_verified_user(&pool, "Alice", "alice@x.com", "hash", Role::Author)
            .await
            .unwrap();
        assert!(!user.is_blocked());

        let banned = update_status(&pool, user.id, UserStatus::Banned).await.unwrap().unwrap();
        assert!(banned.is_blocked());

        let active = update_status(&pool, user.id, UserStatus::Active).await.unwrap().unwrap();
        assert!(!active.is_blocked());
    }

    #[tokio::test]
    async fn test_reset_token_roundtrip_clears_on_password_update() {
        let pool = connect_in_memory().await.unwrap();
        let user = create_verified_user(&pool, "Alice", "alice@x.com", "hash", Role::Author)
            .await
            .unwrap();

        set_reset_token(&pool, user.id, "abc123", Utc::now()).await.unwrap();
        let found = get_user_by_reset_token(&pool, "abc123").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let updated = update_password(&pool, user.id, "newhash").await.unwrap().unwrap();
        assert_eq!(updated.password_hash.as_deref(), Some("newhash"));
        assert_eq!(updated.reset_password_token, None);
        assert!(get_user_by_reset_token(&pool, "abc123").await.unwrap().is_none());
    }
}
