use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Rate limiter keyed by client IP address.
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Limiter plus the message returned once a client is over quota.
#[derive(Clone)]
pub struct LoginRateLimit {
    pub limiter: IpRateLimiter,
    pub message: String,
    /// Key on the first `x-forwarded-for` hop instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl LoginRateLimit {
    /// `attempts` requests per `window_seconds` per IP, refilled evenly.
    pub fn new(attempts: u32, window_seconds: u64) -> Self {
        let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
        let window = Duration::from_secs(window_seconds.max(1));
        let period = window / attempts.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(attempts))
            .allow_burst(attempts);

        Self {
            limiter: Arc::new(RateLimiter::dashmap(quota)),
            message: format!(
                "Too many login attempts from this IP, please try again after a {} second pause",
                window.as_secs()
            ),
            trust_forwarded_for: false,
        }
    }

    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn peer_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn client_ip(request: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        forwarded_ip(request).or_else(|| peer_ip(request))
    } else {
        peer_ip(request)
    }
}

/// Per-IP limiter for credential endpoints.
pub async fn login_rate_limit_middleware(
    State(limit): State<LoginRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&request, limit.trust_forwarded_for) else {
        tracing::warn!("Could not determine IP for rate limiting");
        return Ok(next.run(request).await);
    };

    match limit.limiter.check_key(&ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(negative) => {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            tracing::warn!(ip = %ip, "Login rate limit exceeded");
            Err(AppError::TooManyRequests(
                limit.message.clone(),
                Some(wait_time.as_secs().max(1)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_then_limits() {
        let limit = LoginRateLimit::new(3, 60);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limit.limiter.check_key(&ip).is_ok());
        assert!(limit.limiter.check_key(&ip).is_ok());
        assert!(limit.limiter.check_key(&ip).is_ok());
        assert!(limit.limiter.check_key(&ip).is_err());
    }

    #[test]
    fn keys_are_independent() {
        let limit = LoginRateLimit::new(1, 60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limit.limiter.check_key(&a).is_ok());
        assert!(limit.limiter.check_key(&a).is_err());
        assert!(limit.limiter.check_key(&b).is_ok());
    }

    fn request_from(peer: &str, forwarded: &str) -> Request {
        let mut request = axum::http::Request::builder()
            .header("x-forwarded-for", forwarded)
            .body(axum::body::Body::empty())
            .unwrap();
        let addr: SocketAddr = format!("{}:4000", peer).parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn forwarded_header_ignored_unless_trusted() {
        let request = request_from("192.0.2.10", "10.9.9.1");

        assert_eq!(
            client_ip(&request, false),
            Some("192.0.2.10".parse().unwrap())
        );
        assert_eq!(
            client_ip(&request, true),
            Some("10.9.9.1".parse().unwrap())
        );
    }

    #[test]
    fn trusted_falls_back_to_peer_on_garbage_header() {
        let request = request_from("192.0.2.10", "not-an-ip");
        assert_eq!(
            client_ip(&request, true),
            Some("192.0.2.10".parse().unwrap())
        );
    }

    #[test]
    fn message_names_the_window() {
        let limit = LoginRateLimit::new(5, 60);
        assert!(limit.message.ends_with("after a 60 second pause"));
    }
}
