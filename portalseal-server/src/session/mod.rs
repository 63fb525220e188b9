pub mod store;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::state::AppState;

pub use store::{HandshakeStore, StoreError};

/// Periodically drop expired handshakes and idle rate-limiter keys.
///
/// Correctness never depends on this task; `HandshakeStore::get` already
/// treats expired entries as absent.
pub fn spawn_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.handshakes.cleanup_expired();
            state.handshake_limiter.retain_recent();
            if removed > 0 {
                tracing::debug!(removed, remaining = state.handshakes.len(), "swept expired handshakes");
            }
        }
    })
}
