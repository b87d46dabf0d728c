/**
 * Session Response
 *
 * Every API flow that ends in a signed-in user (verify, login, password
 * reset) answers the same way: a fresh token in the JSON body and in the
 * session cookie. Federated sign-in ends in a browser redirect instead and
 * only sets the cookie.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::backend::auth::delivery::session_cookie;
use crate::backend::auth::handlers::types::{AuthResponse, UserResponse};
use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Sign a session token for `user`
pub fn issue_session_token(state: &AppState, user: &User) -> Result<String, BackendError> {
    state.tokens.issue(user.id, &user.email).map_err(|e| {
        BackendError::internal(format!("Failed to create token for {}: {}", user.id, e))
    })
}

/// Issue a session for `user` and build the response
pub fn send_session(
    state: &AppState,
    user: User,
    status: StatusCode,
    message: &str,
) -> Result<Response, BackendError> {
    let token = issue_session_token(state, &user)?;

    let jar = session_cookie(CookieJar::new(), &token, &state.config.cookie);
    let body = AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        user: UserResponse::from(user),
    };

    Ok((status, jar, Json(body)).into_response())
}
