/**
 * Authentication Middleware
 *
 * Per-request identity gates. Both variants locate a session token
 * (bearer header first, then the `token` cookie), verify it, and load the
 * user it names. Account status is read from the store on every request,
 * so deactivating a user takes effect immediately regardless of the
 * tokens they hold.
 *
 * - `require_auth` rejects with 401 when there is no usable token or the
 *   user is gone, and 403 when the account is inactive or banned. The
 *   precise reason is logged; the client sees a generic message.
 * - `optional_auth` never rejects for identity reasons; it just attaches
 *   the user when one is proven.
 *
 * Handlers read the identity with the `AuthUser` / `MaybeUser` extractors.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::credentials::ensure_active;
use crate::backend::auth::delivery::extract_token;
use crate::backend::auth::policy::authorize_roles;
use crate::backend::auth::users::{self, Role, User};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

const LOGIN_REQUIRED: &str = "Please login to access this resource";
const INVALID_SESSION: &str = "Invalid or expired session. Please login again";

/// Identity attached to the request by the auth middleware
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

/// Resolve the user behind a token
async fn authenticate(state: &AppState, token: &str) -> Result<User, BackendError> {
    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::warn!("Rejected session token: {}", e);
        BackendError::unauthenticated(INVALID_SESSION)
    })?;

    let user_id = claims.user_id().map_err(|e| {
        tracing::warn!("Rejected session token: {}", e);
        BackendError::unauthenticated(INVALID_SESSION)
    })?;

    let user = users::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Session token for unknown user {}", user_id);
            BackendError::unauthenticated(INVALID_SESSION)
        })?;

    ensure_active(&user)?;
    Ok(user)
}

/// Identity for a request, if it proves one
///
/// Token and status failures yield `None`; store failures still propagate.
pub async fn identify(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, BackendError> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };

    match authenticate(state, &token).await {
        Ok(user) => Ok(Some(user)),
        Err(e @ BackendError::DatabaseError(_)) => Err(e),
        Err(e) => {
            tracing::debug!("Continuing without identity: {}", e);
            Ok(None)
        }
    }
}

/// Required authentication middleware
///
/// Attaches [`AuthenticatedUser`] to the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing session token for {}", request.uri().path());
        BackendError::unauthenticated(LOGIN_REQUIRED)
    })?;

    let user = authenticate(&state, &token).await?;
    request.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(request).await)
}

/// Optional authentication middleware
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    if let Some(user) = identify(&state, request.headers()).await? {
        request.extensions_mut().insert(AuthenticatedUser { user });
    }
    Ok(next.run(request).await)
}

/// Admin-only gate; must run inside `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, BackendError> {
    let auth = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| BackendError::unauthenticated(LOGIN_REQUIRED))?;

    authorize_roles(&auth.user, &[Role::Admin])?;
    Ok(next.run(request).await)
}

/// Extractor for the authenticated user
///
/// Rejects with 401 when no auth layer attached an identity.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|auth| AuthUser(auth.user.clone()))
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthenticated(LOGIN_REQUIRED)
            })
    }
}

/// Extractor for an optional identity
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|auth| auth.user.clone()),
        ))
    }
}
