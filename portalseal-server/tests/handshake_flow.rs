//! Drives the real router with the real client library through an
//! in-process transport.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::Router;
use portalseal_client::transport::{parse_body, ApiTransport, HandshakeTransport, OutgoingRequest, RawResponse};
use portalseal_client::{ApiRequest, ClientConfig, ClientError, HandshakeManager, ProtectedClient};
use portalseal_core::codec::AadPolicy;
use portalseal_core::constants::{HANDSHAKE_HEADER, NEGOTIATE_PATH};
use portalseal_core::handshake::{NegotiateRequest, NegotiateResponse};
use portalseal_core::platform::{ManualClock, NativeClock, NativeRandom};
use portalseal_server::{api, AppState, Config};
use serde_json::json;
use tower::ServiceExt;

const ORIGIN: &str = "https://portal.example";

struct InProcess {
    router: Router,
    negotiations: AtomicUsize,
    requests: AtomicUsize,
    drop_handshake_header: AtomicBool,
}

impl InProcess {
    fn new(router: Router) -> Arc<Self> {
        Arc::new(Self {
            router,
            negotiations: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
            drop_handshake_header: AtomicBool::new(false),
        })
    }

    async fn call(&self, request: Request<Body>) -> Result<RawResponse, ClientError> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(RawResponse {
            status,
            body: parse_body(&bytes),
        })
    }
}

#[async_trait]
impl HandshakeTransport for InProcess {
    async fn negotiate(&self, request: &NegotiateRequest) -> Result<NegotiateResponse, ClientError> {
        self.negotiations.fetch_add(1, Ordering::SeqCst);
        let body = serde_json::to_vec(request).map_err(|e| ClientError::Transport(e.to_string()))?;
        let request = Request::post(NEGOTIATE_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, ORIGIN)
            .body(Body::from(body))
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let response = self.call(request).await?;
        if !response.is_success() {
            return Err(ClientError::Negotiation {
                status: response.status,
            });
        }
        serde_json::from_value(response.body).map_err(|e| ClientError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ApiTransport for InProcess {
    async fn send(&self, outgoing: OutgoingRequest) -> Result<RawResponse, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut builder = Request::builder()
            .method(outgoing.method.clone())
            .uri(outgoing.path.as_str());
        for (name, value) in &outgoing.headers {
            if self.drop_handshake_header.load(Ordering::SeqCst) && name == HANDSHAKE_HEADER {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = match &outgoing.body {
            Some(value) => Body::from(serde_json::to_vec(value).map_err(|e| ClientError::Transport(e.to_string()))?),
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.call(request).await
    }
}

struct Harness {
    transport: Arc<InProcess>,
    clock: Arc<ManualClock>,
    state: Arc<AppState>,
    client: Arc<ProtectedClient>,
}

fn harness(config: Config) -> Harness {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let state = Arc::new(AppState::with_platform(
        config,
        Arc::new(NativeRandom::new()),
        clock.clone(),
    ));
    let transport = InProcess::new(api::build_router(state.clone()));

    let client_config = ClientConfig::new(ORIGIN)
        .unwrap()
        .with_aad_policy(AadPolicy::Strict);
    let manager = Arc::new(HandshakeManager::new(
        transport.clone(),
        Arc::new(NativeRandom::new()),
        Arc::new(NativeClock::new()),
    ));
    let client = Arc::new(ProtectedClient::new(manager, transport.clone(), &client_config));

    Harness {
        transport,
        clock,
        state,
        client,
    }
}

#[tokio::test]
async fn settings_round_trip_after_negotiation() {
    let mut config = Config::default();
    config.portal.portal_title = "IT Portal".to_string();
    config.portal.azure_client_secret_configured = true;
    let h = harness(config);

    let value = h.client.fetch(&ApiRequest::get("/api/settings")).await.unwrap();

    assert_eq!(value["settings"]["portal_title"], "IT Portal");
    assert_eq!(value["settings"]["azure_client_secret"], "");
    assert_eq!(value["settings"]["azure_client_secret_configured"], true);
    assert_eq!(h.transport.negotiations.load(Ordering::SeqCst), 1);
    assert_eq!(h.state.handshakes.len(), 1);
}

#[tokio::test]
async fn identity_and_config_endpoints_decrypt() {
    let h = harness(Config::default());

    let config = h.client.fetch(&ApiRequest::get("/api/auth/config")).await.unwrap();
    assert_eq!(config["localLoginEnabled"], true);

    let err = h.client.fetch(&ApiRequest::get("/api/auth/me")).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 401, .. }));
    assert_eq!(h.transport.negotiations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_handshake_renegotiates_once() {
    let h = harness(Config::default());

    h.client.fetch(&ApiRequest::get("/api/settings")).await.unwrap();
    h.clock.advance(Duration::from_secs(601));

    let value = h.client.fetch(&ApiRequest::get("/api/settings")).await.unwrap();
    assert!(value["settings"].is_object());
    assert_eq!(h.transport.negotiations.load(Ordering::SeqCst), 2);
    assert_eq!(h.transport.requests.load(Ordering::SeqCst), 3);
    assert_eq!(h.state.handshakes.len(), 1, "expired entry evicted on read");
}

#[tokio::test]
async fn persistent_handshake_required_is_terminal() {
    let h = harness(Config::default());
    h.transport.drop_handshake_header.store(true, Ordering::SeqCst);

    let err = h.client.fetch(&ApiRequest::get("/api/settings")).await.unwrap_err();

    assert!(matches!(err, ClientError::SecureSessionUnavailable));
    assert_eq!(h.transport.negotiations.load(Ordering::SeqCst), 2);
    assert_eq!(h.transport.requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_fetches_share_one_negotiation() {
    let h = harness(Config::default());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let client = h.client.clone();
        tasks.spawn(async move { client.fetch(&ApiRequest::get("/api/auth/config")).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(h.transport.negotiations.load(Ordering::SeqCst), 1);
    assert_eq!(h.state.handshakes.len(), 1);
}

#[tokio::test]
async fn generic_route_is_wrapped_and_unwrapped() {
    let mut config = Config::default();
    config.encryption_enabled = true;
    let h = harness(config);

    let value = h
        .client
        .fetch(&ApiRequest::get("/api/admin/handshakes"))
        .await
        .unwrap();

    assert_eq!(value, json!({ "active_handshakes": 1, "ttl_secs": 600, "kid": "v1" }));
}
