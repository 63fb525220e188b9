//! Payload codec: AES-256-GCM over canonical JSON, bound to a session, an
//! origin and an endpoint through the AAD.

pub mod bundle;
pub mod context;
pub mod envelope;

pub use bundle::EncryptedBundle;
pub use context::{endpoint_from_path, AadPolicy, PayloadContext};
pub use envelope::{BundleClass, ResponseEnvelope};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::constants::{ALG_A256GCM, GCM_NONCE_LEN};
use crate::crypto::aes_gcm::{aes256_gcm_decrypt, aes256_gcm_encrypt};
use crate::handshake::SessionKey;
use crate::traits::clock::Clock;
use crate::traits::random::SecureRandom;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Deliberately carries no cause: tag, key and AAD failures look identical.
    #[error("payload authentication failed")]
    AuthFailure,
    #[error("payload encryption failed: {0}")]
    Seal(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Encrypt a JSON-serializable payload under a fresh random nonce.
pub fn encrypt<T: Serialize + ?Sized>(
    payload: &T,
    key: &SessionKey,
    kid: &str,
    context: &PayloadContext,
    rng: &dyn SecureRandom,
    clock: &dyn Clock,
) -> Result<EncryptedBundle> {
    let plaintext =
        serde_json::to_vec(payload).map_err(|e| CodecError::Seal(format!("serialize: {e}")))?;

    let mut iv = [0u8; GCM_NONCE_LEN];
    rng.fill_bytes(&mut iv)
        .map_err(|e| CodecError::Seal(e.to_string()))?;

    let (ct, tag) = aes256_gcm_encrypt(key.as_bytes(), &iv, &plaintext, &context.aad())
        .map_err(|e| CodecError::Seal(e.to_string()))?;

    let ts = clock
        .now_millis()
        .map_err(|e| CodecError::Seal(e.to_string()))?;

    Ok(EncryptedBundle {
        kid: kid.to_string(),
        alg: ALG_A256GCM.to_string(),
        iv: BASE64_STANDARD.encode(iv),
        ct: BASE64_STANDARD.encode(ct),
        tag: BASE64_STANDARD.encode(tag),
        ts,
    })
}

/// Decrypt a bundle, trying the current AAD first and, when the policy
/// allows, the single legacy shape.
pub fn decrypt(
    bundle: &EncryptedBundle,
    key: &SessionKey,
    context: &PayloadContext,
    policy: AadPolicy,
) -> Result<Value> {
    if !bundle.is_supported_alg() {
        return Err(CodecError::AuthFailure);
    }

    let iv = decode_field(&bundle.iv)?;
    let ct = decode_field(&bundle.ct)?;
    let tag = decode_field(&bundle.tag)?;

    let plaintext = match aes256_gcm_decrypt(key.as_bytes(), &iv, &ct, &tag, &context.aad()) {
        Ok(pt) => pt,
        Err(_) if policy == AadPolicy::AllowLegacy => {
            let pt = aes256_gcm_decrypt(key.as_bytes(), &iv, &ct, &tag, &context.legacy_aad())
                .map_err(|_| CodecError::AuthFailure)?;
            tracing::warn!(
                handshake_id = %context.handshake_id(),
                endpoint = %context.endpoint(),
                "accepted bundle with legacy AAD (no endpoint binding)"
            );
            pt
        }
        Err(_) => return Err(CodecError::AuthFailure),
    };

    serde_json::from_slice(&plaintext).map_err(|_| CodecError::AuthFailure)
}

fn decode_field(value: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(value)
        .map_err(|_| CodecError::AuthFailure)
}
