//! Identity provider for tests
//!
//! `StubIdentityProvider` answers authorization codes from a table instead
//! of calling out to Google.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ayu_blog::backend::auth::federated::{FederatedError, FederatedProfile, IdentityProvider};

pub const STUB_AUTHORIZE_URL: &str = "https://accounts.example/authorize";

#[derive(Clone, Default)]
pub struct StubIdentityProvider {
    profiles: Arc<Mutex<HashMap<String, FederatedProfile>>>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `code` redeem for a verified profile
    pub fn with_code(self, code: &str, name: &str, email: &str) -> Self {
        self.with_profile(
            code,
            FederatedProfile {
                name: name.to_string(),
                email: email.to_string(),
                email_verified: true,
            },
        )
    }

    pub fn with_profile(self, code: &str, profile: FederatedProfile) -> Self {
        self.profiles.lock().unwrap().insert(code.to_string(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("{}?state={}", STUB_AUTHORIZE_URL, state)
    }

    async fn fetch_profile(&self, code: &str) -> Result<FederatedProfile, FederatedError> {
        self.profiles
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| FederatedError::Rejected("invalid_grant".to_string()))
    }
}
