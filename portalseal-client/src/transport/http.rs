use async_trait::async_trait;
use portalseal_core::constants::NEGOTIATE_PATH;
use portalseal_core::handshake::{NegotiateRequest, NegotiateResponse};
use reqwest::header::ORIGIN;
use reqwest::Client;

use super::{parse_body, ApiTransport, HandshakeTransport, OutgoingRequest, RawResponse};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// HTTP transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("portalseal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HandshakeTransport for HttpTransport {
    async fn negotiate(&self, request: &NegotiateRequest) -> Result<NegotiateResponse> {
        let url = self.config.url(NEGOTIATE_PATH)?;
        tracing::debug!(%url, "negotiating handshake");

        let response = self
            .client
            .post(url)
            .header(ORIGIN, &self.config.origin)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Negotiation {
                status: status.as_u16(),
            });
        }

        response
            .json::<NegotiateResponse>()
            .await
            .map_err(|e| ClientError::Transport(format!("decode handshake response: {e}")))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse> {
        let url = self.config.url(&request.path)?;
        let mut builder = self.client.request(request.method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: parse_body(&bytes),
        })
    }
}
