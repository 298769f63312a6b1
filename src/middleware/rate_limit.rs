// middleware/rate_limit.rs
//! Sliding-window limiter for brute-forceable endpoints, keyed by client address.
//!
//! The address is the TCP peer unless the limiter is told to trust
//! `x-forwarded-for`, which only makes sense behind a proxy that overwrites it.
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ErrorMessage, HttpError};

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
            trust_forwarded_for: false,
        }
    }

    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        let entry = requests.entry(key.to_string()).or_default();
        entry.retain(|&timestamp| now.duration_since(timestamp) < self.window);

        if entry.len() < self.max_requests {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Forgets keys with no requests inside the window.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        requests.retain(|_, stamps| {
            stamps.retain(|&timestamp| now.duration_since(timestamp) < self.window);
            !stamps.is_empty()
        });
    }
}

/// Ten attempts per client per ten minutes.
pub fn otp_rate_limiter() -> RateLimiter {
    RateLimiter::new(10, Duration::from_secs(10 * 60))
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = match client_id(&request, limiter.trust_forwarded_for) {
        Some(client) => client,
        None => {
            tracing::warn!("No client address for {}, skipping rate limit", request.uri().path());
            return next.run(request).await;
        }
    };
    let key = format!("{}:{}", client, request.uri().path());

    if !limiter.is_allowed(&key) {
        tracing::warn!("Rate limit exceeded for {}", key);
        return HttpError::too_many_requests(ErrorMessage::TooManyRequests.to_string())
            .into_response();
    }

    next.run(request).await
}

/// Requires the server to be started with `into_make_service_with_connect_info`.
fn client_id(request: &Request, trust_forwarded_for: bool) -> Option<String> {
    let forwarded = trust_forwarded_for
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .flatten();

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_limit_per_key() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.is_allowed("a"));

        std::thread::sleep(Duration::from_millis(30));
        limiter.prune();
        assert!(limiter.requests.lock().unwrap().is_empty());
    }

    fn app(limiter: RateLimiter) -> Router {
        Router::new()
            .route("/verify", post(|| async { "ok" }))
            .layer(from_fn_with_state(Arc::new(limiter), rate_limit_middleware))
    }

    fn request(peer: [u8; 4], forwarded_for: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method("POST").uri("/verify");
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        request
    }

    #[tokio::test]
    async fn test_middleware_returns_429() {
        let app = app(RateLimiter::new(1, Duration::from_secs(60)));

        let first = app.clone().oneshot(request([10, 0, 0, 1], None)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(request([10, 0, 0, 1], None)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_peers_get_separate_buckets() {
        let app = app(RateLimiter::new(1, Duration::from_secs(60)));

        let a = app.clone().oneshot(request([10, 0, 0, 1], None)).await.unwrap();
        let b = app.clone().oneshot(request([10, 0, 0, 2], None)).await.unwrap();
        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);

        let a_again = app.oneshot(request([10, 0, 0, 1], None)).await.unwrap();
        assert_eq!(a_again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_escape_limit() {
        let app = app(RateLimiter::new(3, Duration::from_secs(60)));

        let mut limited = 0;
        for i in 0..20u8 {
            let spoofed = format!("203.0.113.{}", i);
            let response = app
                .clone()
                .oneshot(request([10, 0, 0, 1], Some(&spoofed)))
                .await
                .unwrap();
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            }
        }
        assert_eq!(limited, 17);
    }

    #[tokio::test]
    async fn test_trusted_proxy_keys_by_forwarded_for() {
        let app = app(RateLimiter::new(1, Duration::from_secs(60)).trust_forwarded_for(true));
        let proxy = [10, 0, 0, 254];

        let a = app
            .clone()
            .oneshot(request(proxy, Some("198.51.100.7, 10.0.0.254")))
            .await
            .unwrap();
        let b = app
            .clone()
            .oneshot(request(proxy, Some("198.51.100.8")))
            .await
            .unwrap();
        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);

        let a_again = app
            .oneshot(request(proxy, Some("198.51.100.7")))
            .await
            .unwrap();
        assert_eq!(a_again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_trusted_proxy_without_header_falls_back_to_peer() {
        let app = app(RateLimiter::new(1, Duration::from_secs(60)).trust_forwarded_for(true));

        let first = app.clone().oneshot(request([10, 0, 0, 1], None)).await.unwrap();
        let other_peer = app.clone().oneshot(request([10, 0, 0, 2], None)).await.unwrap();
        let second = app.oneshot(request([10, 0, 0, 1], None)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(other_peer.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
