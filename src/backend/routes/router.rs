/**
 * Router Configuration
 *
 * Combines the account and post routes into one router and wraps it in
 * the global layers.
 *
 * # Layer Order (outermost first)
 *
 * 1. CORS (answers preflight before anything else runs)
 * 2. Request tracing
 * 3. General rate limit, keyed by client address
 * 4. Per-route gates (auth, post rate limit, admin)
 *
 * # Fallback
 *
 * Unknown routes get a JSON 404.
 */

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::backend::error::BackendError;
use crate::backend::middleware::rate_limit::{
    rate_limit, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
use crate::backend::routes::post_routes::configure_post_routes;
use crate::backend::routes::user_routes::configure_user_routes;
use crate::backend::server::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET])
        .allow_credentials(true)
}

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state; route-level middleware captures it
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();
    let router = configure_user_routes(router, &app_state);
    let router = configure_post_routes(router, &app_state);

    router
        .fallback(|| async { BackendError::not_found("Route not found") })
        .layer(from_fn_with_state(app_state.general_limiter.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&app_state.config.cors_origins))
        .with_state(app_state)
}
