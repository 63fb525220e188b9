use portalseal_core::error::SealError;
use portalseal_core::handshake::{self, HandshakeError, NegotiateRequest, NegotiateResponse};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Answer a client's public key and register the resulting session.
///
/// A malformed key maps to `InvalidKey`; every other failure is internal.
/// Nothing is stored unless the whole exchange succeeded.
pub fn negotiate(state: &AppState, request: &NegotiateRequest) -> Result<NegotiateResponse> {
    if request.client_public_key.trim().is_empty() {
        return Err(ServerError::BadRequest("Missing clientPublicKey".to_string()));
    }

    let (session, response) = match handshake::respond(
        request,
        &state.config.kid,
        state.rng.as_ref(),
        state.clock.as_ref(),
    ) {
        Ok(pair) => pair,
        Err(SealError::Handshake(HandshakeError::InvalidKey(reason))) => {
            tracing::warn!(%reason, "rejected client public key");
            return Err(ServerError::InvalidKey(reason));
        }
        Err(e) => {
            tracing::error!(error = %e, "handshake failed");
            return Err(ServerError::Internal("Handshake failed".to_string()));
        }
    };

    state.handshakes.put(session).map_err(|e| {
        tracing::error!(error = %e, "handshake registration failed");
        ServerError::Internal("Handshake failed".to_string())
    })?;

    tracing::debug!(
        handshake_id = %response.handshake_id,
        kid = %response.kid,
        "handshake negotiated"
    );
    Ok(response)
}
