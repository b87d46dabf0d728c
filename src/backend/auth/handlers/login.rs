/**
 * Login Handler
 *
 * POST /user/login
 *
 * Checks the password of a verified account and issues a session. Every
 * failure (unknown email, unverified account, wrong password) returns the
 * same 401 so responses do not reveal which accounts exist.
 */

use axum::{extract::State, http::StatusCode, response::Response};

use crate::backend::auth::credentials::check_login;
use crate::backend::auth::handlers::session::send_session;
use crate::backend::auth::handlers::types::LoginRequest;
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::server::state::AppState;

/// Login handler
///
/// # Example Request
///
/// ```http
/// POST /user/login HTTP/1.1
/// Content-Type: application/json
///
/// {"email": "alice@x.com", "password": "password1"}
/// ```
///
/// # Example Response
///
/// ```json
/// {
///   "success": true,
///   "message": "User Logged in successfully",
///   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "user": { "id": "…", "name": "Alice", "email": "alice@x.com", … }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, BackendError> {
    let user = check_login(&state.db, &state.hasher, &request.email, &request.password).await?;

    tracing::info!("User logged in: {}", user.id);
    send_session(&state, user, StatusCode::OK, "User Logged in successfully")
}
