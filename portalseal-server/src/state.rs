use std::sync::Arc;

use portalseal_core::platform::{NativeClock, NativeRandom};
use portalseal_core::traits::clock::Clock;
use portalseal_core::traits::random::SecureRandom;

use crate::config::Config;
use crate::middleware::rate_limit::HandshakeRateLimiter;
use crate::session::HandshakeStore;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub config: Config,
    /// Live handshakes (DashMap-backed, TTL-evicted).
    pub handshakes: HandshakeStore,
    pub handshake_limiter: HandshakeRateLimiter,
    pub rng: Arc<dyn SecureRandom>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State backed by the OS random source and system clock.
    pub fn new(config: Config) -> Self {
        Self::with_platform(config, Arc::new(NativeRandom::new()), Arc::new(NativeClock::new()))
    }

    /// State with injected randomness and time, used by tests.
    pub fn with_platform(config: Config, rng: Arc<dyn SecureRandom>, clock: Arc<dyn Clock>) -> Self {
        let handshakes = HandshakeStore::new(config.handshake_ttl, clock.clone());
        let handshake_limiter =
            HandshakeRateLimiter::new(config.handshake_rate_limit, config.handshake_rate_window);
        Self {
            config,
            handshakes,
            handshake_limiter,
            rng,
            clock,
        }
    }
}
