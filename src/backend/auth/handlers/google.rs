/**
 * Google Sign-In Handlers
 *
 * - GET /user/auth/google - start: returns the provider URL and sets the
 *   `oauth_state` cookie
 * - GET /user/auth/google/callback - finish: checks the state, redeems the
 *   code, finds or creates the verified account, sets the session cookie
 *   and redirects to the frontend
 *
 * The callback is reached by browser navigation, so failures that belong
 * to the provider round trip (declined consent, stale or forged state, bad
 * code, unverified email) redirect back to the frontend rather than
 * answering with JSON. Blocked accounts still get the usual 403.
 */

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use cookie::time::Duration;

use crate::backend::auth::credentials::ensure_active;
use crate::backend::auth::delivery::session_cookie;
use crate::backend::auth::federated::{generate_state, IdentityProvider};
use crate::backend::auth::handlers::session::issue_session_token;
use crate::backend::auth::handlers::types::{AuthorizeResponse, FederatedCallbackQuery};
use crate::backend::auth::users;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::validation::{validate_email, validate_name};

/// Cookie holding the state of an in-flight sign-in
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const OAUTH_STATE_PATH: &str = "/user/auth/google";
const OAUTH_STATE_TTL_MINS: i64 = 10;

fn provider(state: &AppState) -> Result<Arc<dyn IdentityProvider>, BackendError> {
    state
        .identity
        .clone()
        .ok_or_else(|| BackendError::not_found("Google login is not configured"))
}

fn state_cookie(value: String, max_age: Duration, state: &AppState) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, value))
        .path(OAUTH_STATE_PATH)
        .http_only(true)
        .secure(state.config.cookie.secure)
        .same_site(state.config.cookie.same_site)
        .max_age(max_age)
        .build()
}

/// Start Google sign-in
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthorizeResponse>), BackendError> {
    let provider = provider(&state)?;
    let oauth_state = generate_state();
    let url = provider.authorize_url(&oauth_state);

    let jar = jar.add(state_cookie(
        oauth_state,
        Duration::minutes(OAUTH_STATE_TTL_MINS),
        &state,
    ));
    Ok((jar, Json(AuthorizeResponse { success: true, url })))
}

/// Finish Google sign-in
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<FederatedCallbackQuery>,
) -> Result<Response, BackendError> {
    let provider = provider(&state)?;
    let home = format!("{}/", state.config.frontend_url);

    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string());
    let jar = jar.add(state_cookie(String::new(), Duration::ZERO, &state));
    let failed = |jar: CookieJar, reason: &str| -> Result<Response, BackendError> {
        tracing::warn!("Google sign-in failed: {}", reason);
        Ok((jar, Redirect::to(&home)).into_response())
    };

    if let Some(error) = query.error.as_deref() {
        return failed(jar, &format!("provider returned {error}"));
    }
    let (Some(code), Some(returned)) = (query.code.as_deref(), query.state.as_deref()) else {
        return failed(jar, "callback without code or state");
    };
    if expected.as_deref().filter(|value| !value.is_empty()) != Some(returned) {
        return failed(jar, "state does not match this browser");
    }

    let profile = match provider.fetch_profile(code).await {
        Ok(profile) => profile,
        Err(e) => return failed(jar, &e.to_string()),
    };
    if !profile.email_verified {
        return failed(jar, "provider has not verified the email");
    }
    let Ok(email) = validate_email(&profile.email) else {
        return failed(jar, "provider returned an invalid email");
    };
    let name = validate_name(&profile.name).unwrap_or_else(|_| {
        email
            .split_once('@')
            .map_or_else(|| email.clone(), |(local, _)| local.to_string())
    });

    let user = users::upsert_federated_user(&state.db, &name, &email).await?;
    ensure_active(&user)?;

    let token = issue_session_token(&state, &user)?;
    tracing::info!("User signed in with Google: {}", user.id);
    let jar = session_cookie(jar, &token, &state.config.cookie);
    Ok((jar, Redirect::to(&home)).into_response())
}
