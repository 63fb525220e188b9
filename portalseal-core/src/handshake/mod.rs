//! Ephemeral ECDH P-256 negotiation producing a session-bound AES-256 key.
//!
//! The server answers a client's public key with its own ephemeral key and a
//! fresh handshake identifier; both sides then run HKDF-SHA-256 over the raw
//! shared secret with the identifier as salt. Nothing secret crosses the wire.

pub mod keys;
pub mod session;
pub mod messages;
pub mod exchange;

pub use exchange::{respond, ClientOffer};
pub use messages::{NegotiateRequest, NegotiateResponse};
pub use session::{HandshakeSession, SessionKey};

use thiserror::Error;

/// Errors from negotiation and session key derivation.
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("Invalid peer public key: {0}")]
    InvalidKey(String),
    #[error("Unknown key version: {0}")]
    UnknownKeyVersion(String),
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),
    #[error("Key generation error: {0}")]
    KeyGeneration(String),
    #[error("Malformed negotiation response: {0}")]
    MalformedResponse(String),
}

/// Convenience alias for handshake operations.
pub type Result<T> = std::result::Result<T, HandshakeError>;
