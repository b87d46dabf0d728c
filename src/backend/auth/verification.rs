/**
 * Verification Codes
 *
 * Short-lived five-digit codes that prove control of an email address
 * during signup.
 *
 * # Lifecycle
 *
 * 1. `issue` stores a fresh code that expires two minutes later
 * 2. The code travels to the user through the mailer
 * 3. `consume` checks it; success verifies the account and clears the code,
 *    expiry clears the code
 *
 * Verification is terminal: consuming against an already verified account
 * succeeds without touching it.
 */

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::auth::users::{self, User};

/// How long an issued code stays valid
pub const CODE_TTL_SECS: i64 = 120;

/// Codes are five digits with a non-zero leading digit
const CODE_RANGE: std::ops::RangeInclusive<i64> = 10_000..=99_999;

/// Why a code was not accepted
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("no account for this email")]
    UnknownEmail,

    #[error("verification code does not match")]
    InvalidCode,

    #[error("verification code expired")]
    Expired,

    /// Another request verified the account between our read and write
    #[error("account was verified concurrently")]
    Conflict,

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

/// Successful outcome of [`consume`]
#[derive(Debug, Clone)]
pub enum Verified {
    /// The account moved from pending to verified
    Newly(User),
    /// The account was verified before this request; nothing changed
    Already(User),
}

impl Verified {
    pub fn user(&self) -> &User {
        match self {
            Self::Newly(user) | Self::Already(user) => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Self::Newly(user) | Self::Already(user) => user,
        }
    }
}

/// Result of checking a code against a loaded record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    AlreadyVerified,
    Accepted,
}

/// Generate a random five-digit code
pub fn generate_code() -> i64 {
    rand::thread_rng().gen_range(CODE_RANGE)
}

/// Expiry instant for a code issued at `now`
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(CODE_TTL_SECS)
}

/// Decide whether `supplied` verifies `user` at `now`
///
/// The code stays valid through its expiry instant and is rejected after.
pub fn check_code(
    user: &User,
    supplied: i64,
    now: DateTime<Utc>,
) -> Result<CodeCheck, VerificationError> {
    if user.account_verified {
        return Ok(CodeCheck::AlreadyVerified);
    }

    if user.verification_code != Some(supplied) {
        return Err(VerificationError::InvalidCode);
    }

    match user.verification_code_expire {
        Some(expires_at) if now <= expires_at => Ok(CodeCheck::Accepted),
        _ => Err(VerificationError::Expired),
    }
}

/// Issue a new code for `user`, replacing any previous one
///
/// # Returns
/// The code, for delivery by the mailer
pub async fn issue(
    pool: &SqlitePool,
    user: &User,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let code = generate_code();
    users::set_verification_code(pool, user.id, code, expiry_from(now)).await?;
    tracing::debug!("Issued verification code for user {}", user.id);
    Ok(code)
}

/// Consume a code for the account registered under `email`
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `email` - Normalized email
/// * `supplied` - Code the user typed
/// * `now` - Current time
///
/// # Errors
/// * `UnknownEmail` - No record for the email
/// * `InvalidCode` - Code does not match (or was already consumed)
/// * `Expired` - Code matched but is past expiry; it is cleared
/// * `Conflict` - A concurrent request verified the account first
pub async fn consume(
    pool: &SqlitePool,
    email: &str,
    supplied: i64,
    now: DateTime<Utc>,
) -> Result<Verified, VerificationError> {
    let user = users::get_user_by_email(pool, email)
        .await?
        .ok_or(VerificationError::UnknownEmail)?;

    let purged = users::delete_pending_siblings(pool, email, user.id).await?;
    if purged > 0 {
        tracing::info!("Removed {} stale pending records for {}", purged, email);
    }

    match check_code(&user, supplied, now) {
        Ok(CodeCheck::AlreadyVerified) => return Ok(Verified::Already(user)),
        Ok(CodeCheck::Accepted) => {}
        Err(VerificationError::Expired) => {
            users::clear_verification_code(pool, user.id).await?;
            return Err(VerificationError::Expired);
        }
        Err(e) => return Err(e),
    }

    match users::mark_verified(pool, user.id, supplied).await? {
        Some(verified) => {
            tracing::info!("Account verified: {}", verified.id);
            Ok(Verified::Newly(verified))
        }
        None => {
            tracing::warn!("Lost verification race for user {}", user.id);
            Err(VerificationError::Conflict)
        }
    }
}
