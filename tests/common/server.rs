//! Test server fixtures
//!
//! Builds the full router over an in-memory database, with fast password
//! hashing and a mailer the test can read back.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::Extension;
use axum_test::TestServer;

use ayu_blog::backend::auth::federated::IdentityProvider;
use ayu_blog::backend::auth::mailer::Mailer;
use ayu_blog::backend::routes::create_router;
use ayu_blog::backend::server::{AppConfig, AppState};

use super::database::create_test_pool;
use super::mailer::CapturingMailer;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// A running app plus handles on its state and outbox
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: CapturingMailer,
}

/// Configuration for tests, with `overrides` applied over the defaults
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = [
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("BCRYPT_COST", "4"),
        ("FRONTEND_URL", "http://localhost:5173"),
    ]
    .into_iter()
    .chain(overrides.iter().copied())
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();

    AppConfig::from_lookup(move |key| vars.get(key).cloned())
}

/// Spawn the app with the default test configuration
pub async fn spawn_app() -> TestApp {
    spawn_app_with(&[]).await
}

/// Spawn the app with configuration overrides
pub async fn spawn_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let mailer = CapturingMailer::new();
    let state = build_state(overrides, Arc::new(mailer.clone())).await;
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

    TestApp {
        server,
        state,
        mailer,
    }
}

/// Spawn the app as seen from one socket peer
///
/// Attaches the `ConnectInfo` a real listener would provide.
pub async fn spawn_app_behind(peer: &str, overrides: &[(&str, &str)]) -> TestApp {
    let peer: SocketAddr = peer.parse().expect("Invalid peer address");
    let mailer = CapturingMailer::new();
    let state = build_state(overrides, Arc::new(mailer.clone())).await;
    let router = create_router(state.clone()).layer(Extension(ConnectInfo(peer)));
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        mailer,
    }
}

/// Spawn the app with federated sign-in through `provider`
pub async fn spawn_app_with_identity(provider: Arc<dyn IdentityProvider>) -> TestApp {
    let mailer = CapturingMailer::new();
    let state = build_state(&[], Arc::new(mailer.clone()))
        .await
        .with_identity_provider(provider);
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

    TestApp {
        server,
        state,
        mailer,
    }
}

/// Spawn the app around a specific mailer
pub async fn spawn_app_with_mailer(mailer: Arc<dyn Mailer>) -> (TestServer, AppState) {
    let state = build_state(&[], mailer).await;
    let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
    (server, state)
}

async fn build_state(overrides: &[(&str, &str)], mailer: Arc<dyn Mailer>) -> AppState {
    let pool = create_test_pool().await;
    AppState::new(pool, test_config(overrides), mailer)
}
