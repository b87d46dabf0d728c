/**
 * Server Initialization
 *
 * Builds the Axum application from configuration.
 *
 * # Initialization Process
 *
 * 1. Open the store and run migrations
 * 2. Choose the mailer (SMTP when configured, logging otherwise)
 * 3. Build `AppState`, with Google sign-in when configured
 * 4. Start the periodic rate-limit reaper
 * 5. Create the router
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use thiserror::Error;

use crate::backend::auth::federated::{FederatedError, GoogleProvider};
use crate::backend::auth::mailer::{LogMailer, MailError, Mailer, SmtpMailer};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, AppConfig};
use crate::backend::server::state::AppState;

/// How often stale rate-limit identities are dropped
const REAP_INTERVAL: Duration = Duration::from_secs(300);

/// Startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("database initialization failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("mailer initialization failed: {0}")]
    Mailer(#[from] MailError),

    #[error("identity provider initialization failed: {0}")]
    Identity(#[from] FederatedError),
}

/// Pick the mailer for a configuration
pub fn build_mailer(config: &AppConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp {
        Some(settings) => {
            tracing::info!("Sending mail through {}:{}", settings.host, settings.port);
            Ok(Arc::new(SmtpMailer::new(settings)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Periodically drop identities with no request left in their window
pub fn spawn_rate_limit_reaper(state: &AppState) -> tokio::task::JoinHandle<()> {
    let limiters = [state.general_limiter.clone(), state.post_limiter.clone()];
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_INTERVAL);
        loop {
            interval.tick().await;
            let now = Instant::now();
            let reaped: usize = limiters.iter().map(|limiter| limiter.reap(now)).sum();
            if reaped > 0 {
                tracing::debug!("Reaped {} idle rate-limit identities", reaped);
            }
        }
    })
}

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails when the store cannot be opened or migrated, or the SMTP relay
/// or Google endpoint settings are unusable.
pub async fn create_app(config: AppConfig) -> Result<Router<()>, InitError> {
    tracing::info!("Initializing ayu-blog backend server");

    let db = load_database(&config.database_url).await?;
    let mailer = build_mailer(&config)?;
    let google = config.google.clone();
    let mut state = AppState::new(db, config, mailer);
    match google {
        Some(settings) => {
            state = state.with_identity_provider(Arc::new(GoogleProvider::new(settings)?));
            tracing::info!("Google sign-in enabled");
        }
        None => tracing::info!("GOOGLE_CLIENT_ID not set; Google sign-in disabled"),
    }

    spawn_rate_limit_reaper(&state);
    tracing::info!("Router configured with periodic rate-limit reaper");

    Ok(create_router(state))
}
