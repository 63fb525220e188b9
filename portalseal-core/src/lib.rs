//! Session-bound payload encryption shared by the portal server and its clients.
//!
//! Key agreement, key derivation, and the payload codec live here so that both
//! peers derive identical session keys and build identical authenticated context.

pub mod error;
pub mod constants;
pub mod traits;
pub mod platform;
pub mod crypto;
pub mod handshake;
pub mod codec;
