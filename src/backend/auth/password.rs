/**
 * Password Hashing
 *
 * One-way, salted bcrypt hashing with a configurable cost. Hashing and
 * verification run on the blocking pool so request tasks keep yielding
 * while bcrypt burns CPU.
 */

use thiserror::Error;

/// Errors from hashing a password
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// bcrypt hasher with a fixed cost factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher; `cost` is clamped to bcrypt's supported range (4..=31)
    pub fn new(cost: u32) -> Self {
        Self { cost: cost.clamp(4, 31) }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a raw password with a fresh salt
    pub async fn hash(&self, raw: &str) -> Result<String, PasswordError> {
        let raw = raw.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost)).await??;
        Ok(hashed)
    }

    /// Check a raw password against a stored hash
    ///
    /// Fails closed: a malformed hash or a failed task is logged and
    /// reported as a mismatch.
    pub async fn verify(&self, raw: &str, hash: &str) -> bool {
        let raw = raw.to_owned();
        let hash = hash.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(raw, &hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                tracing::error!("Password verification error: {:?}", e);
                false
            }
            Err(e) => {
                tracing::error!("Password verification task failed: {:?}", e);
                false
            }
        }
    }
}
