use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{HandshakeError, Result};

/// Body of `POST /api/auth/handshake`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateRequest {
    /// Base64 SPKI DER of the client's ephemeral P-256 key.
    #[serde(default)]
    pub client_public_key: String,
}

/// Server answer to a negotiation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub handshake_id: String,
    /// Base64 SPKI DER of the server's ephemeral P-256 key.
    pub server_public_key: String,
    pub kid: String,
}

pub(crate) fn encode_key(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

pub(crate) fn decode_key(value: &str) -> Result<Vec<u8>> {
    if value.is_empty() {
        return Err(HandshakeError::InvalidKey("missing public key".into()));
    }
    BASE64_STANDARD
        .decode(value.trim())
        .map_err(|e| HandshakeError::InvalidKey(format!("invalid base64: {e}")))
}
