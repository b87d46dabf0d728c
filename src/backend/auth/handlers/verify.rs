/**
 * Verify Handler
 *
 * POST /user/verify with `{email, otp}`.
 *
 * A correct, unexpired code verifies the account and signs it in. Asking
 * again for an account that is already verified succeeds without changing
 * anything, but does not issue a session: only the code proves control of
 * the email, and it is gone once used.
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;

use crate::backend::auth::handlers::session::send_session;
use crate::backend::auth::handlers::types::{MessageResponse, VerifyRequest};
use crate::backend::auth::verification::{self, VerificationError, Verified};
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::server::state::AppState;
use crate::shared::validation::validate_email;

/// Verify account handler
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Response, BackendError> {
    let email = validate_email(&request.email)?;
    let code = request
        .otp
        .as_ref()
        .ok_or_else(|| BackendError::validation("OTP is required"))?
        .code()?;

    match verification::consume(&state.db, &email, code, Utc::now()).await {
        Ok(Verified::Newly(user)) => send_session(&state, user, StatusCode::OK, "Account Verified"),
        Ok(Verified::Already(_)) => {
            Ok(Json(MessageResponse::ok("Account already verified")).into_response())
        }
        Err(VerificationError::UnknownEmail) => Err(BackendError::not_found("User not found")),
        Err(VerificationError::InvalidCode) => {
            tracing::warn!("Wrong verification code for {}", email);
            Err(BackendError::validation("Invalid OTP"))
        }
        Err(VerificationError::Expired) => Err(BackendError::validation("OTP is expired")),
        Err(VerificationError::Conflict) => Err(BackendError::conflict(
            "Account was verified by another request",
        )),
        Err(VerificationError::Store(e)) => Err(e.into()),
    }
}
