/**
 * Signup Handler
 *
 * POST /user/signup
 *
 * # Registration Process
 *
 * 1. Validate name, email and password
 * 2. Hash the password
 * 3. Create the pending record, or refresh the pending record already
 *    registered for the email (one atomic upsert)
 * 4. Issue a verification code and mail it
 *
 * No session is issued here; the account signs in by verifying its email.
 *
 * # Errors
 *
 * * `400 Bad Request` - invalid input
 * * `409 Conflict` - a verified account owns the email
 * * `500 Internal Server Error` - hashing, store or mail failure
 */

use axum::{extract::State, response::Json};
use chrono::Utc;

use crate::backend::auth::credentials::create_pending_account;
use crate::backend::auth::handlers::types::{MessageResponse, SignupRequest};
use crate::backend::auth::mailer::verification_email;
use crate::backend::auth::verification;
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::server::state::AppState;

/// Sign up handler
///
/// # Example Request
///
/// ```http
/// POST /user/signup HTTP/1.1
/// Content-Type: application/json
///
/// {"name": "Alice", "email": "alice@x.com", "password": "password1"}
/// ```
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Json<MessageResponse>, BackendError> {
    tracing::info!("Signup request for email: {}", request.email.trim());

    let user = create_pending_account(
        &state.db,
        &state.hasher,
        &request.name,
        &request.email,
        &request.password,
    )
    .await?;

    let code = verification::issue(&state.db, &user, Utc::now()).await?;

    state
        .mailer
        .send(verification_email(&user.email, code))
        .await
        .map_err(|e| BackendError::internal(format!("Failed to send verification email: {e}")))?;

    tracing::info!("Pending account {} awaiting verification", user.id);
    Ok(Json(MessageResponse::ok("Verification email sent successfully")))
}
