/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler and
 * middleware:
 * - SQLite pool (credential and content store)
 * - Resolved configuration
 * - Session token issuer and password hasher
 * - Mailer
 * - Identity provider for federated sign-in, when configured
 * - The general and post-creation rate limiters
 *
 * Everything in it is cheap to clone (`Arc` or handle types). The
 * `FromRef` implementations let handlers and middleware extract a single
 * piece with `State<T>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::federated::IdentityProvider;
use crate::backend::auth::mailer::Mailer;
use crate::backend::auth::password::PasswordHasher;
use crate::backend::auth::sessions::TokenIssuer;
use crate::backend::middleware::rate_limit::RateLimiter;
use crate::backend::server::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenIssuer>,
    pub hasher: PasswordHasher,
    pub mailer: Arc<dyn Mailer>,
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub general_limiter: RateLimiter,
    pub post_limiter: RateLimiter,
}

impl AppState {
    /// Build state from an open store, configuration and mailer
    pub fn new(db: SqlitePool, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            chrono::Duration::days(config.jwt_expire_days),
        );

        Self {
            db,
            tokens: Arc::new(tokens),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            mailer,
            identity: None,
            general_limiter: RateLimiter::new(config.general_rate_limit)
                .with_trusted_proxies(&config.trusted_proxies),
            post_limiter: RateLimiter::new(config.post_rate_limit)
                .with_trusted_proxies(&config.trusted_proxies),
            config: Arc::new(config),
        }
    }

    /// Enable federated sign-in through `provider`
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
