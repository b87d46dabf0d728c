/**
 * Profile Handlers
 *
 * - POST /user/edit - the authenticated user edits their own profile
 * - PUT /user/{id}/status - an admin activates, deactivates or bans a user
 */

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::backend::auth::handlers::types::{EditProfileRequest, UpdateStatusRequest, UserEnvelope};
use crate::backend::auth::users::{self, ProfileUpdate};
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::middleware::{ownership::parse_id, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::validation::validate_name;

const BIO_MAX_LEN: usize = 500;

/// Edit profile handler
pub async fn edit_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<EditProfileRequest>,
) -> Result<Json<UserEnvelope>, BackendError> {
    let name = request.name.as_deref().map(validate_name).transpose()?;

    let bio = request.bio.map(|b| b.trim().to_string());
    if bio.as_ref().is_some_and(|b| b.chars().count() > BIO_MAX_LEN) {
        return Err(BackendError::validation(format!(
            "Bio cannot exceed {BIO_MAX_LEN} characters"
        )));
    }

    let update = ProfileUpdate {
        name,
        bio,
        profile_image_url: request
            .profile_image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
    };

    let updated = users::update_profile(&state.db, user.id, &update)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    tracing::info!("Profile updated: {}", updated.id);

    Ok(Json(UserEnvelope {
        success: true,
        message: Some("Profile updated successfully".to_string()),
        user: updated.into(),
    }))
}

/// Update account status handler (admin only)
pub async fn update_user_status(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<UserEnvelope>, BackendError> {
    let user_id = parse_id(&raw_id, "user")?;

    let updated = users::update_status(&state.db, user_id, request.status)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    tracing::info!(
        "Admin {} set status of {} to {:?}",
        admin.id,
        updated.id,
        request.status
    );

    Ok(Json(UserEnvelope {
        success: true,
        message: Some("User status updated successfully".to_string()),
        user: updated.into(),
    }))
}
