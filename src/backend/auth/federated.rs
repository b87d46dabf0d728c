/**
 * Federated Sign-In
 *
 * Sign-in through an external identity provider using the OAuth 2.0
 * authorization-code flow. `IdentityProvider` is the seam:
 *
 * - `GoogleProvider` talks to Google's OAuth endpoints with `reqwest`
 * - tests substitute a provider that answers from memory
 *
 * The provider only proves an email address. Turning that into an account
 * (and a session) is done by the callback handler through
 * `users::upsert_federated_user`.
 */

use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from talking to an identity provider
#[derive(Debug, Error)]
pub enum FederatedError {
    #[error("invalid provider endpoint {0}")]
    Endpoint(String),

    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider refused the request: {0}")]
    Rejected(String),
}

/// What the provider vouches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    pub name: String,
    pub email: String,
    pub email_verified: bool,
}

/// An OAuth 2.0 identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser; `state` comes back on the callback
    fn authorize_url(&self, state: &str) -> String;

    /// Redeem an authorization code for the signed-in profile
    async fn fetch_profile(&self, code: &str) -> Result<FederatedProfile, FederatedError>;
}

/// Random value binding a callback to the browser that started the flow
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Google OAuth client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered with Google
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleSettings {
    /// Settings against Google's public endpoints
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

/// Google sign-in over the authorization-code flow
pub struct GoogleProvider {
    client: Client,
    settings: GoogleSettings,
    auth_url: Url,
}

impl GoogleProvider {
    pub fn new(settings: GoogleSettings) -> Result<Self, FederatedError> {
        let endpoint = |raw: &str| {
            Url::parse(raw).map_err(|e| FederatedError::Endpoint(format!("{raw}: {e}")))
        };
        let auth_url = endpoint(&settings.auth_url)?;
        endpoint(&settings.token_url)?;
        endpoint(&settings.userinfo_url)?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, settings, auth_url })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, FederatedError> {
        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(FederatedError::Rejected(format!("token exchange {status}: {error_text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", GOOGLE_SCOPES)
            .append_pair("state", state);
        url.into()
    }

    async fn fetch_profile(&self, code: &str) -> Result<FederatedProfile, FederatedError> {
        let access_token = self.exchange_code(code).await?;

        let response = self
            .client
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FederatedError::Rejected(format!(
                "userinfo {}",
                response.status()
            )));
        }

        let info: UserInfo = response.json().await?;
        let email = info
            .email
            .ok_or_else(|| FederatedError::Rejected("profile has no email".to_string()))?;

        Ok(FederatedProfile {
            name: info.name.unwrap_or_default(),
            email,
            email_verified: info.email_verified,
        })
    }
}
