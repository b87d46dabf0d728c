/**
 * Ownership Check
 *
 * `OwnedPost` is an extractor for routes that modify a post: it loads the
 * post named by the `{id}` path segment and confirms the authenticated
 * caller may edit (or, for DELETE, delete) it. The handler receives the
 * loaded post and does not fetch it again.
 *
 * Rejections: 401 without an identity, 400 for an unparsable ID, 404 when
 * the post does not exist, 403 when the caller is not the owner.
 */

use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, Method},
};
use uuid::Uuid;

use crate::backend::auth::policy::{can, Action};
use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::posts::{db, types::Post};
use crate::backend::server::state::AppState;

/// Parse a path ID, rejecting with a 400 that names the resource
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw.trim()).map_err(|_| BackendError::validation(format!("Invalid {resource} ID")))
}

/// A post the caller is allowed to modify
#[derive(Debug, Clone)]
pub struct OwnedPost {
    pub post: Post,
    pub owner: User,
}

impl FromRequestParts<AppState> for OwnedPost {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(actor) = AuthUser::from_request_parts(parts, state).await?;

        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| BackendError::validation("Invalid post ID"))?;
        let post_id = parse_id(&raw_id, "post")?;

        let post = db::get_post(&state.db, post_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Post not found"))?;

        let action = if parts.method == Method::DELETE {
            Action::DeletePost
        } else {
            Action::EditPost
        };

        if !can(&actor, action, Some(post.owner_id)) {
            tracing::warn!(
                "User {} denied {:?} on post {} owned by {}",
                actor.id,
                action,
                post.id,
                post.owner_id
            );
            return Err(BackendError::forbidden(
                "Access denied. You can only modify your own posts",
            ));
        }

        Ok(OwnedPost { post, owner: actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "post").unwrap(), id);

        let err = parse_id("not-an-id", "post").unwrap_err();
        assert_eq!(err.message(), "Invalid post ID");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
