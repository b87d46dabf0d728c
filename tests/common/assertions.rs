//! Response assertions
//!
//! Every error leaves the server as `{"success": false, "message": ..}`;
//! these helpers check status and message together for clearer failures.

use axum::http::{header, StatusCode};
use cookie::Cookie;
use axum_test::TestResponse;
use serde_json::Value;

/// Assert a JSON error response with the given status and message
pub fn assert_error(response: &TestResponse, status: StatusCode, message: &str) {
    let body: Value = response.json();
    assert_eq!(
        response.status_code(),
        status,
        "unexpected status, body: {}",
        body
    );
    assert_eq!(body["success"], false, "body: {}", body);
    assert_eq!(body["message"], message, "body: {}", body);
}

/// Assert a successful response and return its JSON body
pub fn assert_success(response: &TestResponse, status: StatusCode) -> Value {
    let body: Value = response.json();
    assert_eq!(
        response.status_code(),
        status,
        "unexpected status, body: {}",
        body
    );
    assert_eq!(body["success"], true, "body: {}", body);
    body
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected {:?} to contain {:?}",
            $haystack,
            $needle
        );
    };
}

/// Cookie named `name` among the response's `Set-Cookie` headers
pub fn response_cookie(response: &TestResponse, name: &str) -> Option<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .find(|cookie| cookie.name() == name)
}
