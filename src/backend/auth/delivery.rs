/**
 * Session Delivery
 *
 * Moves session tokens between the server and the client: the `token`
 * cookie (HttpOnly, lifetime from configuration) on the way out, and either
 * an `Authorization: Bearer` header or that cookie on the way in.
 *
 * Cookies are built and parsed with the `cookie` crate through
 * `axum_extra::extract::cookie::CookieJar`, which handles quoting,
 * percent-encoding and the `Expires` date format.
 */

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::{Duration, OffsetDateTime};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Attributes of the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub max_age_days: i64,
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieSettings {
    /// Cross-site, HTTPS-only cookie for production
    pub fn production(max_age_days: i64) -> Self {
        Self { max_age_days, secure: true, same_site: SameSite::None }
    }

    /// Same-site cookie usable over plain HTTP
    pub fn development(max_age_days: i64) -> Self {
        Self { max_age_days, secure: false, same_site: SameSite::Lax }
    }
}

fn build_cookie(value: String, max_age: Duration, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(settings.same_site)
        .max_age(max_age)
        .expires(OffsetDateTime::now_utc() + max_age)
        .build()
}

/// Attach a session token cookie to `jar`
pub fn session_cookie(jar: CookieJar, token: &str, settings: &CookieSettings) -> CookieJar {
    jar.add(build_cookie(
        token.to_string(),
        Duration::days(settings.max_age_days),
        settings,
    ))
}

/// Expire the session cookie in `jar`
pub fn clear_session_cookie(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(build_cookie(String::new(), Duration::ZERO, settings))
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Token from the session cookie
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Locate the candidate session token: bearer header first, then cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use axum::response::IntoResponse;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, value.parse().unwrap());
        }
        map
    }

    fn set_cookie(jar: CookieJar) -> Cookie<'static> {
        let response = jar.into_response();
        let raw = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        Cookie::parse(raw).unwrap()
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = set_cookie(session_cookie(
            CookieJar::new(),
            "abc.def.ghi",
            &CookieSettings::development(5),
        ));

        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(5)));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
        assert!(cookie.expires_datetime().is_some());
    }

    #[test]
    fn test_production_cookie_is_secure_cross_site() {
        let cookie = set_cookie(session_cookie(
            CookieJar::new(),
            "abc",
            &CookieSettings::production(5),
        ));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = set_cookie(clear_session_cookie(
            CookieJar::new(),
            &CookieSettings::development(5),
        ));
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer abc")])),
            Some("abc".to_string())
        );
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer ")])), None);
    }

    #[test]
    fn test_cookie_token() {
        let map = headers(&[("cookie", "theme=dark; token=xyz; lang=en")]);
        assert_eq!(cookie_token(&map), Some("xyz".to_string()));
        assert_eq!(cookie_token(&headers(&[("cookie", "token=")])), None);
        assert_eq!(cookie_token(&headers(&[("cookie", "tokens=abc")])), None);
    }

    #[test]
    fn test_quoted_cookie_value_is_unquoted() {
        let map = headers(&[("cookie", "token=\"abc.def.ghi\"")]);
        assert_eq!(cookie_token(&map), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_header_takes_precedence_over_cookie() {
        let map = headers(&[("authorization", "Bearer from-header"), ("cookie", "token=from-cookie")]);
        assert_eq!(extract_token(&map), Some("from-header".to_string()));

        let map = headers(&[("cookie", "token=from-cookie")]);
        assert_eq!(extract_token(&map), Some("from-cookie".to_string()));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
