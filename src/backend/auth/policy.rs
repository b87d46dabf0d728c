/**
 * Authorization Policy
 *
 * `can` answers "may this user do this to that resource?" as a pure
 * function of the user record and the resource's owner. Middleware and
 * extractors call it instead of comparing fields inline.
 */

use uuid::Uuid;

use crate::backend::auth::users::{Role, User};
use crate::backend::error::BackendError;

/// Something a user may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePost,
    EditPost,
    DeletePost,
    LikePost,
    CommentPost,
    ManageUsers,
}

/// Capability check
///
/// # Arguments
/// * `actor` - Authenticated user
/// * `action` - What they are attempting
/// * `owner` - Owner of the target resource, when the action has one
pub fn can(actor: &User, action: Action, owner: Option<Uuid>) -> bool {
    if actor.is_blocked() {
        return false;
    }

    match action {
        Action::CreatePost | Action::LikePost | Action::CommentPost => true,
        Action::EditPost | Action::DeletePost => owner == Some(actor.id),
        Action::ManageUsers => actor.role == Role::Admin,
    }
}

/// Require `actor` to hold one of `allowed`
pub fn authorize_roles(actor: &User, allowed: &[Role]) -> Result<(), BackendError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        tracing::warn!("User {} with role {:?} denied; requires {:?}", actor.id, actor.role, allowed);
        Err(BackendError::forbidden(format!(
            "Role: {} is not allowed to access this resource",
            actor.role.as_str()
        )))
    }
}
