/**
 * Rate Limiting
 *
 * Sliding-window admission control. Each identity maps to the instants of
 * its admitted requests; a check prunes instants that left the window,
 * rejects when the remaining count has reached the ceiling, and otherwise
 * records the request. Rejected requests are not recorded.
 *
 * The whole read-prune-append sequence runs under one mutex, so concurrent
 * requests for the same identity can never both take the last slot. The
 * map is process-local; separate server processes count independently.
 *
 * Identities with no instant left in the window are dropped by `reap`,
 * which the server runs periodically.
 *
 * Anonymous requests are keyed by the socket peer. `X-Forwarded-For` is
 * read only when the peer is a configured trusted proxy, and then the
 * right-most hop that is not itself a trusted proxy is the client.
 */

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthenticatedUser;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Window length and ceiling for one limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: usize,
}

impl RateLimitConfig {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self { window, max_requests }
    }
}

/// An admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: usize,
    pub remaining: usize,
    /// Until the oldest counted request leaves the window
    pub reset_after: Duration,
}

/// A rejected request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// Shared sliding-window limiter; clones share state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    trusted_proxies: Arc<[IpAddr]>,
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            trusted_proxies: Arc::from(Vec::new()),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Believe `X-Forwarded-For` from these peers
    pub fn with_trusted_proxies(mut self, proxies: &[IpAddr]) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Admit or reject one request from `key` at `now`
    pub fn check(&self, key: &str, now: Instant) -> Result<Admission, RateLimited> {
        let RateLimitConfig { window, max_requests } = self.config;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let hits = windows.entry(key.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|&oldest| now.saturating_duration_since(oldest) >= window)
        {
            hits.pop_front();
        }

        let reset_after = |hits: &VecDeque<Instant>| match hits.front() {
            Some(&oldest) => window.saturating_sub(now.saturating_duration_since(oldest)),
            None => window,
        };

        if hits.len() >= max_requests {
            return Err(RateLimited {
                retry_after: reset_after(&*hits),
            });
        }

        hits.push_back(now);
        Ok(Admission {
            limit: max_requests,
            remaining: max_requests - hits.len(),
            reset_after: reset_after(&*hits),
        })
    }

    /// Drop identities whose every request has left the window
    ///
    /// # Returns
    /// Number of identities removed
    pub fn reap(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, hits| {
            hits.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < window)
        });
        before - windows.len()
    }

    /// Number of identities currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Originating client address
///
/// The peer address, unless the peer is a trusted proxy; then the
/// right-most `X-Forwarded-For` hop that is not a trusted proxy. Hops
/// further left are client-controlled and never consulted.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    hops.into_iter()
        .rev()
        .find(|hop| hop.parse::<IpAddr>().map_or(true, |ip| !trusted.contains(&ip)))
        .map(str::to_string)
        .unwrap_or_else(|| peer.to_string())
}

/// Rate limiting middleware
///
/// Keys by the authenticated user when an auth layer ran first, otherwise
/// by [`client_address`]. Admitted responses carry `X-RateLimit-*` headers;
/// rejections are 429 with `Retry-After`.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let key = match request.extensions().get::<AuthenticatedUser>() {
        Some(auth) => format!("user:{}", auth.user.id),
        None => {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            format!(
                "ip:{}",
                client_address(request.headers(), peer, &limiter.trusted_proxies)
            )
        }
    };

    let admission = limiter.check(&key, Instant::now()).map_err(|limited| {
        tracing::warn!("Rate limit exceeded for {} on {}", key, request.uri().path());
        BackendError::too_many_requests(limited.retry_after)
    })?;

    let mut response = next.run(request).await;

    let reset_at = chrono::Utc::now()
        + chrono::Duration::from_std(admission.reset_after).unwrap_or_else(|_| chrono::Duration::zero());
    let headers = response.headers_mut();
    // An inner route limiter already reported its own window.
    if headers.contains_key(X_RATELIMIT_LIMIT) {
        return Ok(response);
    }
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(admission.remaining));
    if let Ok(value) = HeaderValue::from_str(&reset_at.to_rfc3339()) {
        headers.insert(X_RATELIMIT_RESET, value);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(Duration::from_secs(900), max_requests))
    }

    #[test]
    fn test_admits_exactly_max_requests() {
        let limiter = limiter(10);
        let start = Instant::now();

        for i in 0..10 {
            let admission = limiter
                .check("user:alice", start + Duration::from_secs(i))
                .unwrap();
            assert_eq!(admission.remaining, 9 - i as usize);
        }

        let rejected = limiter.check("user:alice", start + Duration::from_secs(10));
        assert!(rejected.is_err());
    }

    #[test]
    fn test_rejection_is_not_recorded() {
        let limiter = limiter(1);
        let start = Instant::now();
        limiter.check("ip:1.2.3.4", start).unwrap();

        // Hammering while limited must not extend the lockout.
        for s in 1..100 {
            assert!(limiter.check("ip:1.2.3.4", start + Duration::from_secs(s)).is_err());
        }

        assert!(limiter.check("ip:1.2.3.4", start + Duration::from_secs(900)).is_ok());
    }

    #[test]
    fn test_admission_resumes_after_window() {
        let limiter = limiter(2);
        let start = Instant::now();
        limiter.check("k", start).unwrap();
        limiter.check("k", start + Duration::from_secs(100)).unwrap();

        let limited = limiter.check("k", start + Duration::from_secs(200)).unwrap_err();
        assert_eq!(limited.retry_after, Duration::from_secs(700));

        // Only the first request has left the window.
        let later = start + Duration::from_secs(900);
        assert_eq!(limiter.check("k", later).unwrap().remaining, 0);
        assert!(limiter.check("k", later).is_err());
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();
        limiter.check("user:a", now).unwrap();
        assert!(limiter.check("user:a", now).is_err());
        assert!(limiter.check("user:b", now).is_ok());
    }

    #[test]
    fn test_reap_drops_stale_identities() {
        let limiter = limiter(5);
        let start = Instant::now();
        limiter.check("old", start).unwrap();
        limiter.check("fresh", start + Duration::from_secs(800)).unwrap();

        assert_eq!(limiter.reap(start + Duration::from_secs(901)), 1);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_concurrent_checks_never_exceed_ceiling() {
        let limiter = limiter(50);
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..20).filter(|_| limiter.check("shared", now).is_ok()).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    fn forwarded(chain: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", chain.parse().unwrap());
        headers
    }

    #[test]
    fn test_client_address_uses_peer() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        assert_eq!(client_address(&HeaderMap::new(), Some(peer), &[]), "10.0.0.9");
        assert_eq!(client_address(&HeaderMap::new(), None, &[]), "unknown");
    }

    #[test]
    fn test_untrusted_peer_forwarded_header_is_ignored() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_address(&headers, Some(peer), &[]), "10.0.0.9");
        assert_eq!(client_address(&headers, None, &[]), "unknown");
    }

    #[test]
    fn test_trusted_proxy_takes_rightmost_untrusted_hop() {
        let proxy: SocketAddr = "10.0.0.1:443".parse().unwrap();
        let inner: IpAddr = "10.0.0.2".parse().unwrap();
        let trusted = [proxy.ip(), inner];

        // The left-most hop was written by the client.
        let headers = forwarded("1.1.1.1, 203.0.113.7, 10.0.0.2");
        assert_eq!(client_address(&headers, Some(proxy), &trusted), "203.0.113.7");

        let mut headers = forwarded("6.6.6.6");
        headers.append("x-forwarded-for", "198.51.100.2".parse().unwrap());
        assert_eq!(client_address(&headers, Some(proxy), &trusted), "198.51.100.2");

        assert_eq!(client_address(&HeaderMap::new(), Some(proxy), &trusted), "10.0.0.1");
        assert_eq!(client_address(&forwarded("10.0.0.2"), Some(proxy), &trusted), "10.0.0.1");
    }
}
