/**
 * Current User Handlers
 *
 * - GET /user/me - the authenticated user
 * - GET /user/logout - clear the session cookie
 *
 * Sessions are stateless, so logout only removes the cookie; a token the
 * client kept stays valid until it expires.
 */

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::backend::auth::delivery::clear_session_cookie;
use crate::backend::auth::handlers::types::{MessageResponse, UserEnvelope};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Get current user handler
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        success: true,
        message: None,
        user: user.into(),
    })
}

/// Logout handler
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    tracing::info!("User logged out: {}", user.id);
    (
        clear_session_cookie(jar, &state.config.cookie),
        Json(MessageResponse::ok("User logged out successfully")),
    )
        .into_response()
}
