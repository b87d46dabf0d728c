/**
 * Password Reset Handlers
 *
 * - POST /user/password/forgot `{email}` - mail a reset link
 * - PUT /user/password/reset/{token} `{password, confirmPassword}` - set a
 *   new password and sign in
 *
 * Only the SHA-256 of a reset token is stored. The token itself exists in
 * the mailed link and nowhere else.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Json, Response},
};
use chrono::Utc;

use crate::backend::auth::credentials::{ensure_active, generate_reset_token, redeem_reset_token};
use crate::backend::auth::handlers::session::send_session;
use crate::backend::auth::handlers::types::{
    ForgotPasswordRequest, MessageResponse, ResetPasswordRequest,
};
use crate::backend::auth::mailer::reset_password_email;
use crate::backend::auth::users;
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::server::state::AppState;
use crate::shared::validation::{validate_email, validate_password};

/// Forgot password handler
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, BackendError> {
    let email = validate_email(&request.email)?;
    let user = users::get_verified_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    let reset = generate_reset_token(Utc::now());
    users::set_reset_token(&state.db, user.id, &reset.hash, reset.expires_at).await?;

    let url = format!("{}/password/reset/{}", state.config.frontend_url, reset.token);
    if let Err(e) = state.mailer.send(reset_password_email(&user.email, &url)).await {
        users::clear_reset_token(&state.db, user.id).await?;
        return Err(BackendError::internal(format!("Failed to send reset email: {e}")));
    }

    tracing::info!("Password reset requested for {}", user.id);
    Ok(Json(MessageResponse::ok(format!("Email sent to {} successfully", user.email))))
}

/// Reset password handler
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Response, BackendError> {
    let user = redeem_reset_token(&state.db, &token, Utc::now())
        .await?
        .ok_or_else(|| {
            tracing::warn!("Unknown or expired password reset token");
            BackendError::validation("Reset password token is invalid or has been expired")
        })?;
    ensure_active(&user)?;

    if request.password != request.confirm_password {
        return Err(BackendError::validation("Password & confirm password do not match"));
    }
    validate_password(&request.password)?;

    let password_hash = state
        .hasher
        .hash(&request.password)
        .await
        .map_err(|e| BackendError::internal(format!("Failed to hash password: {e}")))?;

    let user = users::update_password(&state.db, user.id, &password_hash)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    tracing::info!("Password reset completed for {}", user.id);
    send_session(&state, user, StatusCode::OK, "Password reset successfully")
}
