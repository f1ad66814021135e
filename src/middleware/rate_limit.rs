use crate::error::CheckoutError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type KeyedLimiter = governor::RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Idle client entries are pruned once this many are tracked.
const MAX_TRACKED_CLIENTS: usize = 100_000;

/// Per-client quota of `max_requests` every `window`.
///
/// The full quota is available as a burst and refills evenly across the window.
pub struct RateLimiter {
    limiter: KeyedLimiter,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        let burst = NonZeroU32::new(u32::try_from(max_requests).unwrap_or(u32::MAX)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: governor::RateLimiter::keyed(quota),
        }
    }

    /// Count one request for `client`, returning false once its quota is spent.
    pub fn check(&self, client: &str) -> bool {
        let allowed = self.limiter.check_key(&client.to_string()).is_ok();
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        allowed
    }
}

fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, CheckoutError> {
    let client = client_key(&request);
    if !limiter.check(&client) {
        tracing::info!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return Err(CheckoutError::RateLimitExceeded);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_requests_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));
    }

    #[tokio::test]
    async fn quota_refills_over_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check("10.0.0.1"));
    }

    #[test]
    fn forwarded_header_identifies_the_client() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");

        let anonymous = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(client_key(&anonymous), "unknown");
    }
}
