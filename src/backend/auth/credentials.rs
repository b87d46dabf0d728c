/**
 * Credential Operations
 *
 * Account-level operations that combine validation, hashing and the user
 * store: opening a pending account, checking a login, and the
 * password-reset token.
 */

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::backend::auth::password::PasswordHasher;
use crate::backend::auth::users::{self, User};
use crate::backend::error::BackendError;
use crate::shared::validation::{validate_email, validate_name, validate_password};

/// Message for every failed login, whatever the reason
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Message for every request from an inactive or banned account
pub const ACCOUNT_DEACTIVATED: &str = "Account is deactivated. Please contact support";

/// Lifetime of a password reset token
pub const RESET_TOKEN_TTL_MINS: i64 = 15;

/// Create the pending account for a signup, or refresh the existing one
///
/// # Errors
/// * `ValidationError` - bad name, email or password
/// * `Conflict` - a verified account already owns the email
pub async fn create_pending_account(
    pool: &SqlitePool,
    hasher: &PasswordHasher,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, BackendError> {
    let name = validate_name(name)?;
    let email = validate_email(email)?;
    validate_password(password)?;

    let password_hash = hasher
        .hash(password)
        .await
        .map_err(|e| BackendError::internal(format!("Failed to hash password: {e}")))?;

    match users::upsert_pending_user(pool, &name, &email, &password_hash).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!("Signup refused; email already verified: {}", email);
            Err(BackendError::conflict("Email is already registered"))
        }
    }
}

/// Refuse inactive and banned accounts with 403
pub fn ensure_active(user: &User) -> Result<(), BackendError> {
    if user.is_blocked() {
        tracing::warn!("Blocked user {} ({:?}) refused", user.id, user.status);
        return Err(BackendError::forbidden(ACCOUNT_DEACTIVATED));
    }
    Ok(())
}

/// Check login credentials against verified accounts
///
/// Unknown email, pending account, missing password and wrong password are
/// indistinguishable to the caller. A blocked account with the right
/// password gets 403, never a session.
pub async fn check_login(
    pool: &SqlitePool,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<User, BackendError> {
    let rejected = || BackendError::unauthenticated(INVALID_CREDENTIALS);

    if email.trim().is_empty() || password.is_empty() {
        return Err(BackendError::validation("Email and password are required"));
    }
    let email = validate_email(email).map_err(|_| rejected())?;

    let Some(user) = users::get_verified_user_by_email(pool, &email).await? else {
        tracing::warn!("Login for unknown or unverified email: {}", email);
        return Err(rejected());
    };

    let Some(hash) = user.password_hash.as_deref() else {
        tracing::warn!("Login for account without password: {}", user.id);
        return Err(rejected());
    };

    if !hasher.verify(password, hash).await {
        tracing::warn!("Wrong password for user {}", user.id);
        return Err(rejected());
    }

    ensure_active(&user)?;
    Ok(user)
}

/// SHA-256 (hex) of a reset token, as stored
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A freshly generated reset token
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Sent to the user; never stored
    pub token: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a reset token: 20 random bytes, hex encoded
pub fn generate_reset_token(now: DateTime<Utc>) -> ResetToken {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    ResetToken {
        hash: hash_reset_token(&token),
        token,
        expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINS),
    }
}

/// Find the user a reset token belongs to, if it has not expired
pub async fn redeem_reset_token(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    let user = users::get_user_by_reset_token(pool, &hash_reset_token(token)).await?;
    Ok(user.filter(|u| u.reset_password_expire.is_some_and(|expires| now <= expires)))
}
