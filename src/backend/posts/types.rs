/**
 * Post Types
 *
 * Stored records (`Post`, `Comment`), joined read models that carry the
 * owner or author summary, and the request/response bodies of the post
 * endpoints.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::shared::validation::TagsInput;

/// Stored post
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Json<Vec<String>>,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post joined with its owner's public profile
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithOwner {
    #[sqlx(flatten)]
    pub post: Post,
    pub owner_name: String,
    pub owner_profile_image_url: String,
}

/// Stored comment joined with its author's public profile
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub author_profile_image_url: String,
}

/// Validated fields of a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Validated changes to a post; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

// ---- request bodies ----

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tags: Option<TagsInput>,
    #[serde(alias = "coverImage")]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<TagsInput>,
    #[serde(alias = "coverImage")]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// Query string of the tag search; numbers are parsed by the handler so
/// bad input gets the usual JSON error body
#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

// ---- response bodies ----

/// Public profile summary attached to posts and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub owner: OwnerSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn new(post: Post, owner: OwnerSummary) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            cover_image_url: post.cover_image_url,
            tags: post.tags.0,
            views_count: post.views_count,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            owner,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostWithOwner> for PostResponse {
    fn from(row: PostWithOwner) -> Self {
        let owner = OwnerSummary {
            id: row.post.owner_id,
            name: row.owner_name,
            profile_image_url: row.owner_profile_image_url,
        };
        Self::new(row.post, owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub author: OwnerSummary,
    pub created_at: DateTime<Utc>,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            author: OwnerSummary {
                id: row.user_id,
                name: row.author_name,
                profile_image_url: row.author_profile_image_url,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = (total + limit - 1) / limit;
        Self {
            current_page: page,
            total_pages,
            total_posts: total,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub success: bool,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct TaggedPostsResponse {
    pub success: bool,
    pub tag: String,
    pub posts: Vec<PostResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub success: bool,
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    #[serde(rename = "isLiked")]
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct PostMutationResponse {
    pub success: bool,
    pub message: String,
    pub post: PostResponse,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "isLiked")]
    pub is_liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentMutationResponse {
    pub success: bool,
    pub message: String,
    pub comment: CommentResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        assert_eq!(
            Pagination::new(1, 10, 25),
            Pagination {
                current_page: 1,
                total_pages: 3,
                total_posts: 25,
                has_next: true,
                has_prev: false,
            }
        );

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_next);
        assert!(last.has_prev);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let value = serde_json::to_value(Pagination::new(2, 5, 12)).unwrap();
        assert_eq!(value["currentPage"], 2);
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["hasPrev"], true);
    }
}
