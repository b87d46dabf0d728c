/**
 * Authentication Handler Types
 *
 * Request and response bodies shared by the account handlers.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::{Role, User, UserStatus};
use crate::backend::error::BackendError;

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Raw password; hashed before storage
    #[serde(default)]
    pub password: String,
}

/// Verification code as sent by clients: a number or a numeric string
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OtpInput {
    Number(i64),
    Text(String),
}

impl OtpInput {
    pub fn code(&self) -> Result<i64, BackendError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| BackendError::validation("Invalid OTP")),
        }
    }
}

/// Verify account request
#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyRequest {
    #[serde(default)]
    pub email: String,
    pub otp: Option<OtpInput>,
}

/// Where the browser should go to sign in with a provider
#[derive(Deserialize, Serialize, Debug)]
pub struct AuthorizeResponse {
    pub success: bool,
    pub url: String,
}

/// Query string of a provider callback
#[derive(Deserialize, Debug, Default)]
pub struct FederatedCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user declined or the provider failed
    pub error: Option<String>,
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile edit request; absent fields are left unchanged
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct EditProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    #[serde(alias = "profileImage")]
    pub profile_image_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Admin status change request
#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: UserStatus,
}

/// Auth response
///
/// Returned whenever a session is issued. The token is also set as the
/// `token` cookie.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// Response carrying a user
#[derive(Serialize, Deserialize, Debug)]
pub struct UserEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    pub user: UserResponse,
}

/// Response with only a message
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

/// User response (without sensitive data)
///
/// Never includes the password hash, verification code or reset token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub profile_image_url: String,
    pub role: Role,
    pub status: Option<UserStatus>,
    pub account_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            profile_image_url: user.profile_image_url,
            role: user.role,
            status: user.status,
            account_verified: user.account_verified,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_accepts_number_or_string() {
        let body: VerifyRequest =
            serde_json::from_str(r#"{"email":"a@b.co","otp":12345}"#).unwrap();
        assert_eq!(body.otp.unwrap().code().unwrap(), 12345);

        let body: VerifyRequest =
            serde_json::from_str(r#"{"email":"a@b.co","otp":" 54321 "}"#).unwrap();
        assert_eq!(body.otp.unwrap().code().unwrap(), 54321);

        let err = OtpInput::Text("12a45".to_string()).code().unwrap_err();
        assert_eq!(err.message(), "Invalid OTP");
    }

    #[test]
    fn test_reset_request_field_names() {
        let body: ResetPasswordRequest =
            serde_json::from_str(r#"{"password":"newpass12","confirmPassword":"newpass12"}"#)
                .unwrap();
        assert_eq!(body.password, body.confirm_password);
    }

    #[test]
    fn test_status_request_rejects_unknown_status() {
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status":"banned"}"#).is_ok());
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status":"deleted"}"#).is_err());
    }
}
