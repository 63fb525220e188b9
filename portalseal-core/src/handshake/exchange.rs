use super::keys::{derive_session_key, params_for};
use super::messages::{decode_key, encode_key, NegotiateRequest, NegotiateResponse};
use super::session::HandshakeSession;
use super::HandshakeError;
use crate::constants::HANDSHAKE_ID_ENTROPY_LEN;
use crate::crypto::ecdh::{parse_public_key, P256KeyPair};
use crate::error::Result;
use crate::traits::clock::Clock;
use crate::traits::random::SecureRandom;

/// Fresh opaque handshake identifier (UUID string over 16 random bytes).
pub fn generate_handshake_id(rng: &dyn SecureRandom) -> Result<String> {
    let mut bytes = [0u8; HANDSHAKE_ID_ENTROPY_LEN];
    rng.fill_bytes(&mut bytes)?;
    Ok(uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string())
}

/// Server side of a negotiation: answer the client's key and derive the session.
///
/// Pure with respect to shared state; the caller registers the session.
pub fn respond(
    request: &NegotiateRequest,
    kid: &str,
    rng: &dyn SecureRandom,
    clock: &dyn Clock,
) -> Result<(HandshakeSession, NegotiateResponse)> {
    params_for(kid)?;

    let client_der = decode_key(&request.client_public_key)?;
    let client_key = parse_public_key(&client_der)
        .map_err(|e| HandshakeError::InvalidKey(e.to_string()))?;

    let server_keys = P256KeyPair::generate(rng)
        .map_err(|e| HandshakeError::KeyGeneration(e.to_string()))?;
    let server_der = server_keys.public_key_der()?;

    let shared = server_keys.shared_secret(&client_key);
    let handshake_id = generate_handshake_id(rng)?;
    let key = derive_session_key(&shared, &handshake_id, kid)?;
    let created_at_ms = clock.now_millis()?;

    let response = NegotiateResponse {
        handshake_id: handshake_id.clone(),
        server_public_key: encode_key(&server_der),
        kid: kid.to_string(),
    };
    let session = HandshakeSession::new(handshake_id, key, kid.to_string(), created_at_ms);

    Ok((session, response))
}

/// Client side of a negotiation: holds the ephemeral key pair between the
/// request and the server's answer.
#[derive(Debug)]
pub struct ClientOffer {
    keys: P256KeyPair,
    request: NegotiateRequest,
}

impl ClientOffer {
    pub fn new(rng: &dyn SecureRandom) -> Result<Self> {
        let keys = P256KeyPair::generate(rng)
            .map_err(|e| HandshakeError::KeyGeneration(e.to_string()))?;
        let der = keys.public_key_der()?;
        Ok(Self {
            request: NegotiateRequest {
                client_public_key: encode_key(&der),
            },
            keys,
        })
    }

    pub fn request(&self) -> &NegotiateRequest {
        &self.request
    }

    /// Run the same ECDH + HKDF derivation as the server. Consumes the offer so
    /// the ephemeral secret cannot be reused.
    pub fn complete(self, response: &NegotiateResponse, clock: &dyn Clock) -> Result<HandshakeSession> {
        if response.handshake_id.is_empty() {
            return Err(HandshakeError::MalformedResponse("empty handshakeId".into()).into());
        }

        let server_der = decode_key(&response.server_public_key)?;
        let server_key = parse_public_key(&server_der)
            .map_err(|e| HandshakeError::InvalidKey(e.to_string()))?;

        let shared = self.keys.shared_secret(&server_key);
        let key = derive_session_key(&shared, &response.handshake_id, &response.kid)?;

        Ok(HandshakeSession::new(
            response.handshake_id.clone(),
            key,
            response.kid.clone(),
            clock.now_millis()?,
        ))
    }
}
