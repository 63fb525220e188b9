use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock as _, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Per-IP limiter for the negotiate route.
///
/// `max_requests` negotiations may burst at once; the allowance refills evenly
/// over `window`.
pub struct HandshakeRateLimiter {
    limiter: Option<DefaultKeyedRateLimiter<IpAddr>>,
}

impl HandshakeRateLimiter {
    /// A zero limit disables limiting.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let limiter = NonZeroU32::new(max_requests)
            .and_then(|burst| {
                let period = window.checked_div(max_requests)?;
                Quota::with_period(period).map(|quota| quota.allow_burst(burst))
            })
            .map(RateLimiter::keyed);
        Self { limiter }
    }

    /// `Err` carries how long the caller should wait.
    pub fn check(&self, ip: IpAddr) -> std::result::Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Forget keys whose allowance has fully refilled.
    pub fn retain_recent(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
        }
    }
}

/// Axum middleware applying [`HandshakeRateLimiter`] to the peer address.
pub async fn limit_handshakes(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(wait) = state.handshake_limiter.check(ip) {
        tracing::warn!(%ip, "handshake rate limit exceeded");
        return Err(ServerError::TooManyRequests {
            retry_after_secs: wait.as_secs().max(1),
        });
    }
    Ok(next.run(request).await)
}
