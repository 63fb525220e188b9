use portalseal_core::codec::AadPolicy;
use reqwest::Url;

use crate::error::{ClientError, Result};

/// Where the client talks to and which origin it binds into the AAD.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Sent as the `Origin` header; must match what the server resolves.
    pub origin: String,
    pub aad_policy: AadPolicy,
}

impl ClientConfig {
    /// Config for `server`, with the origin taken from the server URL.
    pub fn new(server: &str) -> Result<Self> {
        let base_url = Url::parse(server)
            .map_err(|e| ClientError::Config(format!("invalid server URL '{server}': {e}")))?;
        let origin = base_url.origin();
        if !origin.is_tuple() {
            return Err(ClientError::Config(format!("server URL '{server}' has no origin")));
        }
        Ok(Self {
            origin: origin.ascii_serialization(),
            base_url,
            aad_policy: AadPolicy::default(),
        })
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_aad_policy(mut self, policy: AadPolicy) -> Self {
        self.aad_policy = policy;
        self
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid request path '{path}': {e}")))
    }
}
