//! Network seams: the negotiate call and protected API requests.

pub mod http;

use async_trait::async_trait;
use portalseal_core::handshake::{NegotiateRequest, NegotiateResponse};
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;

pub use http::HttpTransport;

/// Carries `POST /api/auth/handshake`.
#[async_trait]
pub trait HandshakeTransport: Send + Sync {
    async fn negotiate(&self, request: &NegotiateRequest) -> Result<NegotiateResponse>;
}

/// Carries protected API requests.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse>;
}

#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    /// Path and query, e.g. `/api/settings`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a response. Non-JSON bodies arrive as a JSON string,
/// an empty body as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse a response body the way both transports report it.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
