use std::sync::Arc;

use parking_lot::Mutex;
use portalseal_core::handshake::{ClientOffer, HandshakeSession};
use portalseal_core::traits::clock::Clock;
use portalseal_core::traits::random::SecureRandom;

use crate::error::{ClientError, Result};
use crate::transport::HandshakeTransport;

/// Observable phase of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Idle,
    Negotiating,
    Ready,
}

#[derive(Debug)]
enum Slot {
    Idle,
    Negotiating,
    Ready(Arc<HandshakeSession>),
}

#[derive(Debug)]
struct Inner {
    slot: Slot,
    /// Bumped every time a new session is installed.
    generation: u64,
    /// Id of the most recently started negotiation.
    attempts: u64,
    /// Negotiations up to this id were discarded by `reset()`.
    discarded_through: u64,
    last_failure: Option<(u64, Arc<ClientError>)>,
}

impl Inner {
    /// First negotiation whose outcome a caller arriving now may share: the
    /// one in flight, or else the next one to start.
    fn joinable_attempt(&self) -> u64 {
        match self.slot {
            Slot::Negotiating => self.attempts,
            _ => self.attempts + 1,
        }
    }
}

/// Owns the client's single cached handshake.
///
/// Concurrent callers share one negotiation and its outcome: the async `gate`
/// serializes negotiations, `generation` lets a caller that waited behind a
/// successful negotiation reuse its session, and `last_failure` hands a
/// failed attempt's error to everyone who was waiting on it.
pub struct HandshakeManager {
    transport: Arc<dyn HandshakeTransport>,
    rng: Arc<dyn SecureRandom>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    gate: tokio::sync::Mutex<()>,
}

impl HandshakeManager {
    pub fn new(
        transport: Arc<dyn HandshakeTransport>,
        rng: Arc<dyn SecureRandom>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            rng,
            clock,
            inner: Mutex::new(Inner {
                slot: Slot::Idle,
                generation: 0,
                attempts: 0,
                discarded_through: 0,
                last_failure: None,
            }),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Return a ready session, negotiating when there is none or when `force`
    /// is set.
    ///
    /// A forced call that finds a session installed after it started reuses
    /// that session. A negotiation that fails while callers wait fails all of
    /// them with the same [`ClientError::HandshakeFailed`].
    pub async fn ensure(&self, force: bool) -> Result<Arc<HandshakeSession>> {
        let (observed, joinable) = {
            let inner = self.inner.lock();
            if let (Slot::Ready(session), false) = (&inner.slot, force) {
                return Ok(session.clone());
            }
            (inner.generation, inner.joinable_attempt())
        };

        let _gate = self.gate.lock().await;

        {
            let inner = self.inner.lock();
            if let Slot::Ready(session) = &inner.slot {
                if !force || inner.generation != observed {
                    return Ok(session.clone());
                }
            }
            if let Some((attempt, cause)) = &inner.last_failure {
                if *attempt >= joinable {
                    return Err(ClientError::HandshakeFailed(cause.clone()));
                }
            }
        }

        self.negotiate().await
    }

    /// Drop the cached session and discard any negotiation in flight. No
    /// network traffic.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.slot = Slot::Idle;
        inner.discarded_through = inner.attempts;
        tracing::debug!("handshake reset");
    }

    /// Drop the cached session only if it is still `handshake_id`.
    ///
    /// Returns whether anything was cleared. A session another caller already
    /// renegotiated is left alone.
    pub fn invalidate(&self, handshake_id: &str) -> bool {
        let mut inner = self.inner.lock();
        match &inner.slot {
            Slot::Ready(session) if session.handshake_id() == handshake_id => {
                inner.slot = Slot::Idle;
                tracing::debug!(handshake_id, "stale handshake invalidated");
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> HandshakePhase {
        match self.inner.lock().slot {
            Slot::Idle => HandshakePhase::Idle,
            Slot::Negotiating => HandshakePhase::Negotiating,
            Slot::Ready(_) => HandshakePhase::Ready,
        }
    }

    pub fn current(&self) -> Option<Arc<HandshakeSession>> {
        match &self.inner.lock().slot {
            Slot::Ready(session) => Some(session.clone()),
            _ => None,
        }
    }

    /// Runs with the gate held.
    async fn negotiate(&self) -> Result<Arc<HandshakeSession>> {
        let pending = PendingNegotiation::begin(&self.inner);

        match self.exchange().await {
            Ok(session) => {
                if pending.install(session.clone()) {
                    tracing::debug!(
                        handshake_id = %session.handshake_id(),
                        kid = %session.kid(),
                        "handshake ready"
                    );
                } else {
                    tracing::debug!(
                        handshake_id = %session.handshake_id(),
                        "handshake completed after reset, not cached"
                    );
                }
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "handshake negotiation failed");
                let cause = Arc::new(e);
                pending.fail(cause.clone());
                Err(ClientError::HandshakeFailed(cause))
            }
        }
    }

    async fn exchange(&self) -> Result<Arc<HandshakeSession>> {
        let offer = ClientOffer::new(self.rng.as_ref())?;
        let response = self.transport.negotiate(offer.request()).await?;
        Ok(Arc::new(offer.complete(&response, self.clock.as_ref())?))
    }
}

/// Moves the slot to `Negotiating`, and back to `Idle` unless a session was
/// installed before drop (failure or a cancelled future).
struct PendingNegotiation<'a> {
    inner: &'a Mutex<Inner>,
    attempt: u64,
    installed: bool,
}

impl<'a> PendingNegotiation<'a> {
    fn begin(inner: &'a Mutex<Inner>) -> Self {
        let mut guard = inner.lock();
        guard.attempts += 1;
        guard.slot = Slot::Negotiating;
        let attempt = guard.attempts;
        drop(guard);
        Self {
            inner,
            attempt,
            installed: false,
        }
    }

    /// Cache the session unless `reset()` discarded this attempt meanwhile.
    fn install(mut self, session: Arc<HandshakeSession>) -> bool {
        let mut inner = self.inner.lock();
        if self.attempt <= inner.discarded_through {
            return false;
        }
        inner.slot = Slot::Ready(session);
        inner.generation += 1;
        self.installed = true;
        true
    }

    fn fail(self, cause: Arc<ClientError>) {
        self.inner.lock().last_failure = Some((self.attempt, cause));
    }
}

impl Drop for PendingNegotiation<'_> {
    fn drop(&mut self) {
        if self.installed {
            return;
        }
        let mut inner = self.inner.lock();
        if matches!(inner.slot, Slot::Negotiating) {
            inner.slot = Slot::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portalseal_core::handshake::{respond, NegotiateRequest, NegotiateResponse};
    use portalseal_core::platform::{ManualClock, NativeClock, NativeRandom};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers with the real server-side exchange, optionally after a delay.
    struct CountingTransport {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingTransport {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail: false,
            })
        }

        fn failing(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HandshakeTransport for CountingTransport {
        async fn negotiate(&self, request: &NegotiateRequest) -> Result<NegotiateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ClientError::Negotiation { status: 503 });
            }
            let (_, response) = respond(request, "v1", &NativeRandom::new(), &NativeClock::new())?;
            Ok(response)
        }
    }

    /// Never answers.
    struct HangingTransport;

    #[async_trait]
    impl HandshakeTransport for HangingTransport {
        async fn negotiate(&self, _request: &NegotiateRequest) -> Result<NegotiateResponse> {
            std::future::pending().await
        }
    }

    fn manager(transport: Arc<dyn HandshakeTransport>) -> Arc<HandshakeManager> {
        Arc::new(HandshakeManager::new(
            transport,
            Arc::new(NativeRandom::new()),
            Arc::new(ManualClock::new(0)),
        ))
    }

    #[tokio::test]
    async fn test_ensure_is_cached() {
        let transport = CountingTransport::new(Duration::ZERO);
        let manager = manager(transport.clone());
        assert_eq!(manager.state(), HandshakePhase::Idle);

        let first = manager.ensure(false).await.unwrap();
        let second = manager.ensure(false).await.unwrap();
        assert_eq!(first.handshake_id(), second.handshake_id());
        assert_eq!(transport.calls(), 1);
        assert_eq!(manager.state(), HandshakePhase::Ready);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_negotiates_once() {
        let transport = CountingTransport::new(Duration::from_millis(20));
        let manager = manager(transport.clone());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let manager = manager.clone();
            tasks.spawn(async move { manager.ensure(false).await.unwrap().handshake_id().to_string() });
        }

        let mut ids = Vec::new();
        while let Some(id) = tasks.join_next().await {
            ids.push(id.unwrap());
        }
        assert_eq!(transport.calls(), 1);
        assert!(ids.iter().all(|id| id == &ids[0]));
    }

    #[tokio::test]
    async fn test_concurrent_forced_ensure_shares_renegotiation() {
        let transport = CountingTransport::new(Duration::from_millis(20));
        let manager = manager(transport.clone());
        let stale = manager.ensure(false).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let manager = manager.clone();
            tasks.spawn(async move { manager.ensure(true).await.unwrap().handshake_id().to_string() });
        }
        while let Some(id) = tasks.join_next().await {
            assert_ne!(id.unwrap(), stale.handshake_id());
        }
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_force_replaces_session() {
        let transport = CountingTransport::new(Duration::ZERO);
        let manager = manager(transport.clone());
        let first = manager.ensure(false).await.unwrap();
        let second = manager.ensure(true).await.unwrap();
        assert_ne!(first.handshake_id(), second.handshake_id());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_and_invalidate() {
        let transport = CountingTransport::new(Duration::ZERO);
        let manager = manager(transport.clone());
        let session = manager.ensure(false).await.unwrap();

        assert!(!manager.invalidate("someone-else"));
        assert_eq!(manager.state(), HandshakePhase::Ready);
        assert!(manager.invalidate(session.handshake_id()));
        assert_eq!(manager.state(), HandshakePhase::Idle);
        assert!(manager.current().is_none());

        manager.ensure(false).await.unwrap();
        manager.reset();
        assert_eq!(manager.state(), HandshakePhase::Idle);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_to_idle() {
        let transport = CountingTransport::failing(Duration::ZERO);
        let manager = manager(transport.clone());
        let err = manager.ensure(false).await.unwrap_err();
        match err {
            ClientError::HandshakeFailed(cause) => {
                assert!(matches!(*cause, ClientError::Negotiation { status: 503 }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(manager.state(), HandshakePhase::Idle);

        // A later call starts a fresh attempt rather than replaying the old error.
        manager.ensure(false).await.unwrap_err();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_failed_negotiation() {
        let transport = CountingTransport::failing(Duration::from_millis(20));
        let manager = manager(transport.clone());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let manager = manager.clone();
            tasks.spawn(async move { manager.ensure(false).await });
        }
        while let Some(result) = tasks.join_next().await {
            let err = result.unwrap().unwrap_err();
            assert!(matches!(err, ClientError::HandshakeFailed(_)));
        }
        assert_eq!(transport.calls(), 1);
        assert_eq!(manager.state(), HandshakePhase::Idle);
    }

    #[tokio::test]
    async fn test_reset_discards_negotiation_in_flight() {
        let transport = CountingTransport::new(Duration::from_millis(30));
        let manager = manager(transport.clone());

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.ensure(false).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(manager.state(), HandshakePhase::Negotiating);

        manager.reset();
        assert_eq!(manager.state(), HandshakePhase::Idle);

        task.await.unwrap().unwrap();
        assert_eq!(manager.state(), HandshakePhase::Idle);
        assert!(manager.current().is_none());

        manager.ensure(false).await.unwrap();
        assert_eq!(manager.state(), HandshakePhase::Ready);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_negotiation_returns_to_idle() {
        let manager = manager(Arc::new(HangingTransport));
        let result = tokio::time::timeout(Duration::from_millis(20), manager.ensure(false)).await;
        assert!(result.is_err());
        assert_eq!(manager.state(), HandshakePhase::Idle);
        assert!(manager.current().is_none());
    }
}
