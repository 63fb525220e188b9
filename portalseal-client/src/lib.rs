//! Client side of the payload-encryption handshake: a single shared
//! [`HandshakeManager`] and a [`ProtectedClient`] that decrypts responses and
//! recovers from stale sessions.

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod transport;

pub use client::{ApiRequest, ProtectedClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use manager::{HandshakeManager, HandshakePhase};
