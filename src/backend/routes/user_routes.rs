/**
 * Account Routes
 *
 * ## Public
 * - `POST /user/signup` - Create or refresh a pending account, mail a code
 * - `POST /user/verify` - Verify with the mailed code, sign in
 * - `POST /user/login` - Sign in
 * - `POST /user/password/forgot` - Mail a password reset link
 * - `PUT /user/password/reset/{token}` - Set a new password, sign in
 * - `GET /user/auth/google` - Start Google sign-in
 * - `GET /user/auth/google/callback` - Finish Google sign-in, redirect home
 *
 * ## Authenticated
 * - `GET /user/me` - Current user
 * - `GET /user/logout` - Clear the session cookie
 * - `POST /user/edit` - Edit own profile
 *
 * ## Admin
 * - `PUT /user/{id}/status` - Activate, deactivate or ban a user
 */

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};

use crate::backend::auth::handlers::{
    edit_profile, forgot_password, get_me, google_callback, google_login, login, logout,
    reset_password, signup, update_user_status, verify_otp,
};
use crate::backend::middleware::{require_admin, require_auth};
use crate::backend::server::state::AppState;

/// Configure account routes
pub fn configure_user_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let auth = || from_fn_with_state(state.clone(), require_auth);

    router
        .route("/user/signup", post(signup))
        .route("/user/verify", post(verify_otp))
        .route("/user/login", post(login))
        .route("/user/password/forgot", post(forgot_password))
        .route("/user/password/reset/{token}", put(reset_password))
        .route("/user/auth/google", get(google_login))
        .route("/user/auth/google/callback", get(google_callback))
        .route("/user/me", get(get_me).route_layer(auth()))
        .route("/user/logout", get(logout).route_layer(auth()))
        .route("/user/edit", post(edit_profile).route_layer(auth()))
        .route(
            "/user/{id}/status",
            put(update_user_status)
                .route_layer(from_fn(require_admin))
                .route_layer(auth()),
        )
}
