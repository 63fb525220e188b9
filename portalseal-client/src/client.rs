use std::sync::Arc;

use portalseal_core::codec::{self, endpoint_from_path, AadPolicy, BundleClass, PayloadContext, ResponseEnvelope};
use portalseal_core::constants::{HANDSHAKE_HEADER, HANDSHAKE_REQUIRED_STATUS};
use portalseal_core::handshake::HandshakeSession;
use portalseal_core::platform::{NativeClock, NativeRandom};
use reqwest::Method;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::manager::HandshakeManager;
use crate::transport::{ApiTransport, HttpTransport, OutgoingRequest};

/// A request to a protected endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

enum Attempt {
    Done(Value),
    /// The server no longer knows the session or the bundle did not open.
    Stale(Arc<HandshakeSession>),
}

/// Fetches protected endpoints and hands back decrypted payloads.
///
/// A stale handshake (HTTP 426) or a bundle that fails authentication
/// triggers one renegotiation and one retry; a second failure is terminal.
pub struct ProtectedClient {
    manager: Arc<HandshakeManager>,
    api: Arc<dyn ApiTransport>,
    origin: String,
    policy: AadPolicy,
}

impl ProtectedClient {
    pub fn new(manager: Arc<HandshakeManager>, api: Arc<dyn ApiTransport>, config: &ClientConfig) -> Self {
        Self {
            manager,
            api,
            origin: config.origin.clone(),
            policy: config.aad_policy,
        }
    }

    /// Client over HTTP with OS randomness and the system clock.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        let manager = Arc::new(HandshakeManager::new(
            transport.clone(),
            Arc::new(NativeRandom::new()),
            Arc::new(NativeClock::new()),
        ));
        Ok(Self::new(manager, transport, &config))
    }

    pub fn manager(&self) -> &Arc<HandshakeManager> {
        &self.manager
    }

    pub async fn fetch(&self, request: &ApiRequest) -> Result<Value> {
        let endpoint = endpoint_from_path(&request.path);

        let stale = match self.attempt(request, &endpoint).await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Stale(session) => session,
        };

        tracing::info!(
            handshake_id = %stale.handshake_id(),
            %endpoint,
            "handshake stale, renegotiating"
        );
        self.manager.invalidate(stale.handshake_id());

        match self.attempt(request, &endpoint).await? {
            Attempt::Done(value) => Ok(value),
            Attempt::Stale(session) => {
                tracing::warn!(
                    handshake_id = %session.handshake_id(),
                    %endpoint,
                    "secure session unavailable after renegotiation"
                );
                self.manager.invalidate(session.handshake_id());
                Err(ClientError::SecureSessionUnavailable)
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest, endpoint: &str) -> Result<Attempt> {
        let session = match self.manager.ensure(false).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, %endpoint, "secure session unavailable");
                return Err(ClientError::SecureSessionUnavailable);
            }
        };

        let outgoing = OutgoingRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            headers: vec![
                (HANDSHAKE_HEADER.to_string(), session.handshake_id().to_string()),
                ("origin".to_string(), self.origin.clone()),
            ],
            body: request.body.clone(),
        };
        let response = self.api.send(outgoing).await?;

        if response.status == HANDSHAKE_REQUIRED_STATUS {
            return Ok(Attempt::Stale(session));
        }
        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let (class, bundle) = match ResponseEnvelope::classify(response.body) {
            ResponseEnvelope::Plain(value) => return Ok(Attempt::Done(value)),
            ResponseEnvelope::Encrypted { class, bundle } => (class, bundle),
        };

        let context = PayloadContext::new(session.handshake_id(), self.origin.as_str(), endpoint);
        match codec::decrypt(&bundle, session.key(), &context, self.policy) {
            Ok(value) => Ok(Attempt::Done(unwrap_payload(class, value))),
            Err(e) => {
                tracing::debug!(error = %e, %endpoint, field = class.field_name(), "bundle rejected");
                Ok(Attempt::Stale(session))
            }
        }
    }
}

/// Generic bundles carry the handler body as `{"data": body}`.
fn unwrap_payload(class: BundleClass, value: Value) -> Value {
    match (class, value) {
        (BundleClass::Generic, Value::Object(mut map)) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        (_, value) => value,
    }
}
