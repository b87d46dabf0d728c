/**
 * Post Handlers
 *
 * Content endpoints. Identity and ownership arrive through extractors
 * (`AuthUser`, `MaybeUser`, `OwnedPost`), so by the time a handler body
 * runs the caller has already passed every gate the route requires.
 *
 * # Endpoints
 *
 * - `GET /` - all posts
 * - `GET /post?tag=..&page=..&limit=..` - tag search
 * - `POST /post/new` - create (auth, rate limited)
 * - `GET /post/{id}` - one post with comments (optional auth)
 * - `PUT /post/{id}`, `DELETE /post/{id}` - owner only
 * - `POST /post/{id}/like`, `GET /post/{id}/check-like` - auth
 * - `POST /post/{id}/comment` - auth
 * - `GET /post/user/me/{id}` - a user's posts (auth)
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::auth::policy::{can, Action};
use crate::backend::auth::users::{self, User};
use crate::backend::error::{ApiJson, BackendError};
use crate::backend::middleware::{ownership::parse_id, AuthUser, MaybeUser, OwnedPost};
use crate::backend::posts::db;
use crate::backend::posts::types::{
    CommentMutationResponse, CommentRequest, CommentResponse, CreatePostRequest, EditPostRequest,
    LikeResponse, NewPost, OwnerSummary, Pagination, Post, PostChanges, PostDetailResponse,
    PostListResponse, PostMutationResponse, PostResponse, TagQuery, TaggedPostsResponse,
};
use crate::backend::server::state::AppState;
use crate::shared::validation::{
    normalize_tags, validate_comment, validate_post_input, TITLE_MAX_LEN,
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

fn owner_summary(user: &User) -> OwnerSummary {
    OwnerSummary {
        id: user.id,
        name: user.name.clone(),
        profile_image_url: user.profile_image_url.clone(),
    }
}

fn clean_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// Reject actions a blocked or otherwise unauthorized caller may not take
fn ensure_can(actor: &User, action: Action) -> Result<(), BackendError> {
    if can(actor, action, None) {
        Ok(())
    } else {
        tracing::warn!("User {} denied {:?}", actor.id, action);
        Err(BackendError::forbidden("You are not allowed to perform this action"))
    }
}

async fn existing_post(state: &AppState, raw_id: &str) -> Result<Post, BackendError> {
    let post_id = parse_id(raw_id, "post")?;
    db::get_post(&state.db, post_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post not found"))
}

/// List every post, newest first
pub async fn list_all_posts(
    State(state): State<AppState>,
) -> Result<Json<PostListResponse>, BackendError> {
    let posts = db::list_posts(&state.db).await?;
    Ok(Json(PostListResponse {
        success: true,
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

/// Show one post with its owner summary and comments
///
/// Reports `isLiked` when the caller proved an identity.
pub async fn show_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(raw_id): Path<String>,
) -> Result<Json<PostDetailResponse>, BackendError> {
    let post_id = parse_id(&raw_id, "post")?;

    db::record_view(&state.db, post_id).await?;
    let post = db::get_post_with_owner(&state.db, post_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post not found"))?;
    let comments = db::list_comments(&state.db, post_id).await?;

    let is_liked = match &viewer {
        Some(user) => db::has_liked(&state.db, post_id, user.id).await?,
        None => false,
    };

    Ok(Json(PostDetailResponse {
        success: true,
        post: post.into(),
        comments: comments.into_iter().map(CommentResponse::from).collect(),
        is_liked,
    }))
}

/// Create a post owned by the caller
pub async fn new_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostMutationResponse>), BackendError> {
    ensure_can(&user, Action::CreatePost)?;

    let input = validate_post_input(&request.title, &request.content)?;
    let post = NewPost {
        title: input.title,
        content: input.content,
        cover_image_url: clean_url(request.cover_image_url),
        tags: normalize_tags(request.tags)?,
    };

    let post = db::create_post(&state.db, user.id, &post).await?;
    tracing::info!("Post {} created by {}", post.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(PostMutationResponse {
            success: true,
            message: "Post created successfully".to_string(),
            post: PostResponse::new(post, owner_summary(&user)),
        }),
    ))
}

/// Edit a post the caller owns
pub async fn edit_post(
    State(state): State<AppState>,
    OwnedPost { post, owner }: OwnedPost,
    ApiJson(request): ApiJson<EditPostRequest>,
) -> Result<Json<PostMutationResponse>, BackendError> {
    // Validate the post as it will look after the edit.
    let title = request.title.as_deref().unwrap_or(&post.title);
    let content = request.content.as_deref().unwrap_or(&post.content);
    let input = validate_post_input(title, content)?;

    let changes = PostChanges {
        title: request.title.map(|_| input.title),
        content: request.content.map(|_| input.content),
        cover_image_url: clean_url(request.cover_image_url),
        tags: match request.tags {
            Some(tags) => Some(normalize_tags(Some(tags))?),
            None => None,
        },
    };

    let updated = db::update_post(&state.db, post.id, &changes)
        .await?
        .ok_or_else(|| BackendError::not_found("Post not found"))?;
    tracing::info!("Post {} updated by {}", updated.id, owner.id);

    Ok(Json(PostMutationResponse {
        success: true,
        message: "Post updated successfully".to_string(),
        post: PostResponse::new(updated, owner_summary(&owner)),
    }))
}

/// Delete a post the caller owns
pub async fn delete_post(
    State(state): State<AppState>,
    OwnedPost { post, owner }: OwnedPost,
) -> Result<Json<Value>, BackendError> {
    if !db::delete_post(&state.db, post.id).await? {
        return Err(BackendError::not_found("Post not found"));
    }
    tracing::info!("Post {} deleted by {}", post.id, owner.id);

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}

/// Toggle the caller's like on a post
pub async fn like_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<LikeResponse>, BackendError> {
    ensure_can(&user, Action::LikePost)?;
    let post = existing_post(&state, &raw_id).await?;

    let (is_liked, likes_count) = db::toggle_like(&state.db, post.id, user.id).await?;
    let message = if is_liked { "Post liked" } else { "Post unliked" };

    Ok(Json(LikeResponse {
        success: true,
        message: message.to_string(),
        is_liked,
        likes_count,
    }))
}

/// Whether the caller likes a post
pub async fn check_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, BackendError> {
    let post = existing_post(&state, &raw_id).await?;
    let is_liked = db::has_liked(&state.db, post.id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "isLiked": is_liked,
        "likes_count": post.likes_count,
    })))
}

/// Comment on a post
pub async fn comment_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<CommentMutationResponse>), BackendError> {
    ensure_can(&user, Action::CommentPost)?;
    let text = validate_comment(&request.text)?;
    let post = existing_post(&state, &raw_id).await?;

    let comment = db::add_comment(&state.db, post.id, user.id, &text).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentMutationResponse {
            success: true,
            message: "Comment added successfully".to_string(),
            comment: comment.into(),
        }),
    ))
}

fn page_param(raw: Option<&str>, default: i64, name: &str) -> Result<i64, BackendError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .map_err(|_| BackendError::validation(format!("{name} must be a number"))),
    }
}

/// Paginated search by tag
pub async fn posts_by_tag(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Result<Json<TaggedPostsResponse>, BackendError> {
    let tag = query
        .tag
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && t.chars().count() <= TITLE_MAX_LEN)
        .ok_or_else(|| BackendError::validation("Tag is required"))?;

    let page = page_param(query.page.as_deref(), DEFAULT_PAGE, "Page")?;
    let limit = page_param(query.limit.as_deref(), DEFAULT_LIMIT, "Limit")?;
    if page < 1 {
        return Err(BackendError::validation("Page must be at least 1"));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(BackendError::validation(format!(
            "Limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| BackendError::validation("Page is too large"))?;

    let total = db::count_posts_by_tag(&state.db, &tag).await?;
    let posts = db::list_posts_by_tag(&state.db, &tag, limit, offset).await?;

    Ok(Json(TaggedPostsResponse {
        success: true,
        tag,
        posts: posts.into_iter().map(PostResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// All posts owned by a user
pub async fn user_posts(
    State(state): State<AppState>,
    AuthUser(_viewer): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<PostListResponse>, BackendError> {
    let owner_id: Uuid = parse_id(&raw_id, "user")?;
    if users::get_user_by_id(&state.db, owner_id).await?.is_none() {
        return Err(BackendError::not_found("User not found"));
    }

    let posts = db::list_posts_by_owner(&state.db, owner_id).await?;
    Ok(Json(PostListResponse {
        success: true,
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}
