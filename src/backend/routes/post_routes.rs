/**
 * Post Routes
 *
 * Each route lists the gates it needs. Layers added later run first, so
 * `.route_layer(limit).route_layer(auth)` authenticates before counting
 * the request against the caller's quota.
 *
 * ## Public
 * - `GET /` - All posts
 * - `GET /post?tag=..` - Tag search
 * - `GET /post/{id}` - One post (optional auth, reports `isLiked`)
 *
 * ## Authenticated
 * - `POST /post/new` - Create (post rate limit)
 * - `PUT /post/{id}`, `DELETE /post/{id}` - Owner only
 * - `POST /post/{id}/like`, `GET /post/{id}/check-like`
 * - `POST /post/{id}/comment`
 * - `GET /post/user/me/{id}` - A user's posts
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::middleware::{optional_auth, rate_limit, require_auth};
use crate::backend::posts::handlers::{
    check_like, comment_post, delete_post, edit_post, like_post, list_all_posts, new_post,
    posts_by_tag, show_post, user_posts,
};
use crate::backend::server::state::AppState;

/// Configure post routes
pub fn configure_post_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let auth = || from_fn_with_state(state.clone(), require_auth);

    router
        .route("/", get(list_all_posts))
        .route("/post", get(posts_by_tag))
        .route(
            "/post/new",
            post(new_post)
                .route_layer(from_fn_with_state(state.post_limiter.clone(), rate_limit))
                .route_layer(auth()),
        )
        .route(
            "/post/{id}",
            get(show_post)
                .route_layer(from_fn_with_state(state.clone(), optional_auth))
                .merge(put(edit_post).merge(delete(delete_post)).route_layer(auth())),
        )
        .route("/post/{id}/like", post(like_post).route_layer(auth()))
        .route("/post/{id}/check-like", get(check_like).route_layer(auth()))
        .route("/post/{id}/comment", post(comment_post).route_layer(auth()))
        .route("/post/user/me/{id}", get(user_posts).route_layer(auth()))
}
