use super::session::SessionKey;
use super::{HandshakeError, Result};
use crate::constants::*;
use crate::crypto::hkdf;

/// Key-derivation parameter set selected by a `kid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParams {
    pub kid: &'static str,
    pub info: &'static str,
}

/// Every parameter set this build can derive. New versions are appended so
/// in-flight sessions under an older `kid` keep working during rotation.
pub const KEY_PARAMS: &[KeyParams] = &[KeyParams {
    kid: DEFAULT_KID,
    info: HKDF_INFO_V1,
}];

/// Look up the parameter set for a key version.
pub fn params_for(kid: &str) -> Result<&'static KeyParams> {
    KEY_PARAMS
        .iter()
        .find(|p| p.kid == kid)
        .ok_or_else(|| HandshakeError::UnknownKeyVersion(kid.to_string()))
}

/// Derive the 256-bit session key from the raw ECDH secret.
///
/// salt = UTF-8 bytes of the handshake id, info = the versioned context string.
pub fn derive_session_key(
    shared_secret: &[u8],
    handshake_id: &str,
    kid: &str,
) -> Result<SessionKey> {
    let params = params_for(kid)?;
    let okm = hkdf::hkdf_extract_and_expand(
        handshake_id.as_bytes(),
        shared_secret,
        params.info.as_bytes(),
        SESSION_KEY_LEN,
    )
    .map_err(|e| HandshakeError::KeyDerivation(e.to_string()))?;

    SessionKey::from_slice(&okm)
}
