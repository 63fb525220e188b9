use crate::constants::{AAD_SEPARATOR, API_PREFIX};

/// Which authenticated-data shapes `decrypt` will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AadPolicy {
    /// Only `[handshake_id, origin, endpoint]`.
    Strict,
    /// Also accept the older `[handshake_id, origin]` shape after the current
    /// one fails. Migration aid for producers predating endpoint scoping; do
    /// not add further shapes.
    #[default]
    AllowLegacy,
}

/// Parts bound into every bundle's AAD: the negotiated session, the calling
/// origin, and the logical endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadContext {
    handshake_id: String,
    origin: String,
    endpoint: String,
}

impl PayloadContext {
    pub fn new(
        handshake_id: impl Into<String>,
        origin: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            handshake_id: handshake_id.into(),
            origin: origin.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn handshake_id(&self) -> &str {
        &self.handshake_id
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn aad(&self) -> Vec<u8> {
        build_aad(&[self.handshake_id.as_str(), self.origin.as_str(), self.endpoint.as_str()])
    }

    pub fn legacy_aad(&self) -> Vec<u8> {
        build_aad(&[self.handshake_id.as_str(), self.origin.as_str()])
    }
}

pub fn build_aad(parts: &[&str]) -> Vec<u8> {
    parts.join(AAD_SEPARATOR).into_bytes()
}

/// Logical endpoint name for a request path: `/api/auth/config?x=1` -> `auth/config`.
pub fn endpoint_from_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| path.trim_start_matches('/'));
    trimmed.trim_end_matches('/').to_string()
}
