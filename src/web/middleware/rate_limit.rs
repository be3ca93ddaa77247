//! Per-IP rate limiting.
//!
//! Two buckets: a strict one for credential endpoints (login and
//! register) and a looser one for everything else under `/api`.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// Interval between sweeps of idle limiters.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// State for rate limiting.
pub struct RateLimitState {
    auth_limiters: LimiterMap,
    api_limiters: LimiterMap,
    /// Credential endpoint limit (requests per minute).
    auth_rate_limit: u32,
    /// API limit (requests per minute).
    api_rate_limit: u32,
    /// Whether proxy headers name the client.
    trust_proxy_headers: bool,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(auth_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            auth_limiters: RwLock::new(HashMap::new()),
            api_limiters: RwLock::new(HashMap::new()),
            auth_rate_limit,
            api_rate_limit,
            trust_proxy_headers: false,
        }
    }

    /// Key clients by `X-Forwarded-For`/`X-Real-IP` instead of the peer address.
    pub fn with_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    fn limiter_for(limiters: &LimiterMap, ip: &str, requests_per_minute: u32) -> Arc<IpRateLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(|e| e.into_inner());

        // Another request may have inserted it in between.
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Whether a login/register request from `ip` is allowed.
    pub fn check_auth(&self, ip: &str) -> bool {
        Self::limiter_for(&self.auth_limiters, ip, self.auth_rate_limit)
            .check()
            .is_ok()
    }

    /// Whether an API request from `ip` is allowed.
    pub fn check_api(&self, ip: &str) -> bool {
        Self::limiter_for(&self.api_limiters, ip, self.api_rate_limit)
            .check()
            .is_ok()
    }

    /// Drop limiters nobody else holds a reference to.
    pub fn cleanup(&self) {
        for limiters in [&self.auth_limiters, &self.api_limiters] {
            limiters
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|_, v| Arc::strong_count(v) > 1);
        }
    }

    /// Number of tracked client addresses across both buckets.
    pub fn tracked(&self) -> usize {
        [&self.auth_limiters, &self.api_limiters]
            .iter()
            .map(|l| l.read().unwrap_or_else(|e| e.into_inner()).len())
            .sum()
    }

    /// Start a background task that periodically calls [`cleanup`](Self::cleanup).
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                self.cleanup();
            }
        });
    }
}

/// Client IP. Proxy headers are only read when `trust_proxy_headers` is set;
/// otherwise a client could pick its own bucket.
fn client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(forwarded) = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().to_string();
            }
        }

        if let Some(real_ip) = req
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
        {
            return real_ip.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for login and register.
pub async fn auth_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req, state.trust_proxy_headers);

    if !state.check_auth(&ip) {
        tracing::warn!(ip = %ip, path = %req.uri().path(), "Auth rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many attempts. Please try again later.",
        )
            .into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for the general API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req, state.trust_proxy_headers);

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        )
            .into_response();
    }

    next.run(req).await
}
