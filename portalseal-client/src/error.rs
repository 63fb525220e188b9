use std::sync::Arc;

use portalseal_core::error::SealError;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the protected client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Seal(#[from] SealError),

    /// The negotiate route answered with a non-success status.
    #[error("handshake rejected with status {status}")]
    Negotiation { status: u16 },

    /// A negotiation failed; every caller that shared the attempt gets the
    /// same cause.
    #[error("handshake failed: {0}")]
    HandshakeFailed(Arc<ClientError>),

    #[error("request failed with status {status}")]
    Status { status: u16, body: Value },

    /// Stale or undecryptable responses persisted after one renegotiation.
    #[error("could not establish a secure session")]
    SecureSessionUnavailable,
}

pub type Result<T> = std::result::Result<T, ClientError>;
