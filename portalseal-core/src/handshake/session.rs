use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

use super::{HandshakeError, Result};
use crate::constants::SESSION_KEY_LEN;

/// Derived AES-256 session key. Zeroized on drop and redacted from Debug.
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; SESSION_KEY_LEN]>);

impl SessionKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SESSION_KEY_LEN] = bytes.try_into().map_err(|_| {
            HandshakeError::KeyDerivation(format!(
                "session key must be {SESSION_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(Zeroizing::new(array)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// One negotiated session. Immutable after creation: a renegotiation always
/// produces a new session under a new identifier.
#[derive(Debug, Clone)]
pub struct HandshakeSession {
    handshake_id: String,
    key: SessionKey,
    kid: String,
    created_at_ms: u64,
}

impl HandshakeSession {
    pub fn new(handshake_id: String, key: SessionKey, kid: String, created_at_ms: u64) -> Self {
        Self {
            handshake_id,
            key,
            kid,
            created_at_ms,
        }
    }

    pub fn handshake_id(&self) -> &str {
        &self.handshake_id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Expired once strictly more than `ttl` has elapsed since creation.
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
    }
}
