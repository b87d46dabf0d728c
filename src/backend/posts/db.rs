/**
 * Post Database Operations
 *
 * Posts, likes and comments. Counters on `posts` (`likes_count`,
 * `comments_count`) change in the same transaction as the row they count.
 */

use chrono::Utc;
use sqlx::{types::Json, SqlitePool};
use uuid::Uuid;

use crate::backend::posts::types::{CommentWithAuthor, NewPost, Post, PostChanges, PostWithOwner};

const RETURNING_COLUMNS: &str = "id, owner_id, title, content, cover_image_url, tags, \
    views_count, likes_count, comments_count, created_at, updated_at";

const POST_COLUMNS: &str = "p.id, p.owner_id, p.title, p.content, p.cover_image_url, p.tags, \
    p.views_count, p.likes_count, p.comments_count, p.created_at, p.updated_at";

fn with_owner(filter: &str, tail: &str) -> String {
    format!(
        "SELECT {POST_COLUMNS}, u.name AS owner_name, u.profile_image_url AS owner_profile_image_url \
         FROM posts p JOIN users u ON u.id = p.owner_id {filter} {tail}"
    )
}

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.rowid DESC";

/// Create a post owned by `owner_id`
pub async fn create_post(
    pool: &SqlitePool,
    owner_id: Uuid,
    post: &NewPost,
) -> Result<Post, sqlx::Error> {
    let now = Utc::now();
    let query = format!(
        r#"
        INSERT INTO posts (id, owner_id, title, content, cover_image_url, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {RETURNING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Post>(&query)
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.cover_image_url.as_deref())
        .bind(Json(post.tags.clone()))
        .bind(now)
        .fetch_one(pool)
        .await
}

/// Get a post by ID
pub async fn get_post(pool: &SqlitePool, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1");
    sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Get a post with its owner summary
pub async fn get_post_with_owner(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<PostWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, PostWithOwner>(&with_owner("WHERE p.id = $1", ""))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Count one view of a post
pub async fn record_view(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE posts SET views_count = views_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// All posts, newest first
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<PostWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, PostWithOwner>(&with_owner("", NEWEST_FIRST))
        .fetch_all(pool)
        .await
}

/// Posts owned by one user, newest first
pub async fn list_posts_by_owner(
    pool: &SqlitePool,
    owner_id: Uuid,
) -> Result<Vec<PostWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, PostWithOwner>(&with_owner("WHERE p.owner_id = $1", NEWEST_FIRST))
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

const HAS_TAG: &str =
    "WHERE EXISTS (SELECT 1 FROM json_each(p.tags) WHERE json_each.value = $1)";

/// One page of posts carrying `tag`, newest first
pub async fn list_posts_by_tag(
    pool: &SqlitePool,
    tag: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostWithOwner>, sqlx::Error> {
    let query = with_owner(HAS_TAG, &format!("{NEWEST_FIRST} LIMIT $2 OFFSET $3"));
    sqlx::query_as::<_, PostWithOwner>(&query)
        .bind(tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Number of posts carrying `tag`
pub async fn count_posts_by_tag(pool: &SqlitePool, tag: &str) -> Result<i64, sqlx::Error> {
    let query = format!("SELECT COUNT(*) FROM posts p {HAS_TAG}");
    sqlx::query_scalar::<_, i64>(&query)
        .bind(tag)
        .fetch_one(pool)
        .await
}

/// Apply changes to a post
pub async fn update_post(
    pool: &SqlitePool,
    id: Uuid,
    changes: &PostChanges,
) -> Result<Option<Post>, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE posts
        SET title = COALESCE($1, title),
            content = COALESCE($2, content),
            cover_image_url = COALESCE($3, cover_image_url),
            tags = COALESCE($4, tags),
            updated_at = $5
        WHERE id = $6
        RETURNING {RETURNING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Post>(&query)
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.cover_image_url.as_deref())
        .bind(changes.tags.clone().map(Json))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Delete a post with its likes and comments
///
/// # Returns
/// Whether a post was deleted
pub async fn delete_post(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Like the post, or remove the like if the user already gave one
///
/// # Returns
/// `(liked, likes_count)` after the toggle
pub async fn toggle_like(
    pool: &SqlitePool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<(bool, i64), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    if !removed {
        sqlx::query("INSERT INTO post_likes (post_id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(post_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
    }

    let delta: i64 = if removed { -1 } else { 1 };
    let likes_count: i64 = sqlx::query_scalar(
        "UPDATE posts SET likes_count = MAX(likes_count + $1, 0) WHERE id = $2 RETURNING likes_count",
    )
    .bind(delta)
    .bind(post_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((!removed, likes_count))
}

/// Whether `user_id` likes the post
pub async fn has_liked(pool: &SqlitePool, post_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let liked: i64 = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(liked != 0)
}

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.user_id, c.text, c.created_at, \
    u.name AS author_name, u.profile_image_url AS author_profile_image_url \
    FROM comments c JOIN users u ON u.id = c.user_id";

/// Append a comment and bump the post's comment counter
pub async fn add_comment(
    pool: &SqlitePool,
    post_id: Uuid,
    user_id: Uuid,
    text: &str,
) -> Result<CommentWithAuthor, sqlx::Error> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO comments (id, post_id, user_id, text, created_at) VALUES ($1, $2, $3, $4, $5)")
        .bind(id)
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

    let comment = sqlx::query_as::<_, CommentWithAuthor>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(comment)
}

/// Comments on a post, oldest first
pub async fn list_comments(
    pool: &SqlitePool,
    post_id: Uuid,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthor>(&format!(
        "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC, c.rowid ASC"
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::users::{create_verified_user, Role, User};
    use crate::backend::server::config::connect_in_memory;

    async fn author(pool: &SqlitePool, email: &str) -> User {
        create_verified_user(pool, "Alice", email, "hash", Role::Author)
            .await
            .unwrap()
    }

    fn new_post(title: &str, tags: &[&str]) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "Body".to_string(),
            cover_image_url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_with_owner() {
        let pool = connect_in_memory().await.unwrap();
        let alice = author(&pool, "alice@x.com").await;

        let post = create_post(&pool, alice.id, &new_post("Hello", &["rust"])).await.unwrap();
        let row = get_post_with_owner(&pool, post.id).await.unwrap().unwrap();

        assert_eq!(row.post.title, "Hello");
        assert_eq!(row.post.tags.0, vec!["rust".to_string()]);
        assert_eq!(row.owner_name, "Alice");
        assert!(get_post(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tag_search_pages() {
        let pool = connect_in_memory().await.unwrap();
        let alice = author(&pool, "alice@x.com").await;
        for i in 0..3 {
            create_post(&pool, alice.id, &new_post(&format!("Rust {i}"), &["rust", "code"]))
                .await
                .unwrap();
        }
        create_post(&pool, alice.id, &new_post("Cooking", &["food"])).await.unwrap();

        assert_eq!(count_posts_by_tag(&pool, "rust").await.unwrap(), 3);
        assert_eq!(count_posts_by_tag(&pool, "rus").await.unwrap(), 0);

        let first = list_posts_by_tag(&pool, "rust", 2, 0).await.unwrap();
        let second = list_posts_by_tag(&pool, "rust", 2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].post.title, "Rust 2");
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let pool = connect_in_memory().await.unwrap();
        let alice = author(&pool, "alice@x.com").await;
        let post = create_post(&pool, alice.id, &new_post("Hello", &["rust"])).await.unwrap();

        let changes = PostChanges {
            title: Some("Hello again".to_string()),
            ..Default::default()
        };
        let updated = update_post(&pool, post.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.content, "Body");
        assert_eq!(updated.tags.0, vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn test_toggle_like() {
        let pool = connect_in_memory().await.unwrap();
        let alice = author(&pool, "alice@x.com").await;
        let bob = author(&pool, "bob@x.com").await;
        let post = create_post(&pool, alice.id, &new_post("Hello", &[])).await.unwrap();

        assert_eq!(toggle_like(&pool, post.id, bob.id).await.unwrap(), (true, 1));
        assert!(has_liked(&pool, post.id, bob.id).await.unwrap());
        assert_eq!(toggle_like(&pool, post.id, alice.id).await.unwrap(), (true, 2));
        assert_eq!(toggle_like(&pool, post.id, bob.id).await.unwrap(), (false, 1));
        assert!(!has_liked(&pool, post.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_comments_and_cascade_delete() {
        let pool = connect_in_memory().await.unwrap();
        let alice = author(&pool, "alice@x.com").await;
        let post = create_post(&pool, alice.id, &new_post("Hello", &[])).await.unwrap();

        let comment = add_comment(&pool, post.id, alice.id, "First!").await.unwrap();
        assert_eq!(comment.author_name, "Alice");
        assert_eq!(get_post(&pool, post.id).await.unwrap().unwrap().comments_count, 1);
        assert_eq!(list_comments(&pool, post.id).await.unwrap().len(), 1);

        assert!(delete_post(&pool, post.id).await.unwrap());
        assert!(!delete_post(&pool, post.id).await.unwrap());
        assert!(list_comments(&pool, post.id).await.unwrap().is_empty());
    }
}
