use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use portalseal_core::codec::{self, BundleClass, PayloadContext, ResponseEnvelope};
use portalseal_core::constants::HANDSHAKE_HEADER;
use portalseal_core::handshake::HandshakeSession;
use serde::Serialize;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// A validated, unexpired handshake bound to the requesting origin.
#[derive(Debug, Clone)]
pub struct ActiveHandshake {
    session: HandshakeSession,
    origin: String,
}

impl ActiveHandshake {
    pub fn session(&self) -> &HandshakeSession {
        &self.session
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Encrypt `payload` for `endpoint` and wrap it under the field for `class`.
    pub fn seal<T: Serialize + ?Sized>(
        &self,
        state: &AppState,
        class: BundleClass,
        endpoint: &str,
        payload: &T,
    ) -> Result<ResponseEnvelope> {
        let context = PayloadContext::new(self.session.handshake_id(), self.origin.as_str(), endpoint);
        let bundle = codec::encrypt(
            payload,
            self.session.key(),
            self.session.kid(),
            &context,
            state.rng.as_ref(),
            state.clock.as_ref(),
        )
        .map_err(|e| {
            tracing::error!(error = %e, endpoint, "payload encryption failed");
            ServerError::Internal("Encryption failed".to_string())
        })?;
        Ok(ResponseEnvelope::encrypted(class, bundle))
    }
}

/// Resolve the handshake named by the request headers.
///
/// Returns `Ok(None)` when encryption is globally disabled and the route does
/// not force it. Missing, unknown and expired ids all become
/// `HandshakeRequired`.
pub fn require_handshake(
    state: &AppState,
    headers: &HeaderMap,
    force_required: bool,
) -> Result<Option<ActiveHandshake>> {
    if !force_required && !state.config.encryption_enabled {
        return Ok(None);
    }

    let handshake_id = headers
        .get(HANDSHAKE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ServerError::HandshakeRequired)?;

    let session = state.handshakes.get(handshake_id).ok_or_else(|| {
        tracing::debug!(handshake_id, "unknown or expired handshake");
        ServerError::HandshakeRequired
    })?;

    Ok(Some(ActiveHandshake {
        session,
        origin: request_origin(headers),
    }))
}

/// Origin bound into the AAD: the `Origin` header, else one rebuilt from the
/// forwarding headers.
pub fn request_origin(headers: &HeaderMap) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(origin) = header_str(header::ORIGIN.as_str()) {
        return origin.to_string();
    }

    let proto = header_str("x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("http");
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

/// JSON response that must never be cached by intermediaries.
#[derive(Debug)]
pub struct Protected(pub ResponseEnvelope);

impl IntoResponse for Protected {
    fn into_response(self) -> Response {
        (
            [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            Json(self.0),
        )
            .into_response()
    }
}

/// Guard a handler's payload: encrypt it when a handshake applies, otherwise
/// pass it through as plain JSON.
pub fn protect<T: Serialize>(
    state: &AppState,
    headers: &HeaderMap,
    class: BundleClass,
    endpoint: &str,
    payload: &T,
    force_required: bool,
) -> Result<Protected> {
    match require_handshake(state, headers, force_required)? {
        Some(active) => Ok(Protected(active.seal(state, class, endpoint, payload)?)),
        None => {
            let value = serde_json::to_value(payload)
                .map_err(|e| ServerError::Internal(format!("serialize response: {e}")))?;
            Ok(Protected(ResponseEnvelope::Plain(value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use portalseal_core::codec::{decrypt, AadPolicy};
    use portalseal_core::handshake::SessionKey;
    use portalseal_core::platform::{ManualClock, NativeRandom};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state(encryption_enabled: bool) -> (AppState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let mut config = Config::default();
        config.encryption_enabled = encryption_enabled;
        let state = AppState::with_platform(config, Arc::new(NativeRandom::new()), clock.clone());
        let key = SessionKey::from_slice(&[9u8; 32]).unwrap();
        state
            .handshakes
            .put(HandshakeSession::new("hs-1".into(), key, "v1".into(), 0))
            .unwrap();
        (state, clock)
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_disabled_and_not_forced_passes_through() {
        let (state, _) = state(false);
        assert!(require_handshake(&state, &HeaderMap::new(), false).unwrap().is_none());
    }

    #[test]
    fn test_forced_requires_header() {
        let (state, _) = state(false);
        let err = require_handshake(&state, &HeaderMap::new(), true).unwrap_err();
        assert!(matches!(err, ServerError::HandshakeRequired));

        let err = require_handshake(&state, &headers(&[(HANDSHAKE_HEADER, "nope")]), true)
            .unwrap_err();
        assert!(matches!(err, ServerError::HandshakeRequired));
    }

    #[test]
    fn test_enabled_applies_without_force() {
        let (state, _) = state(true);
        let active = require_handshake(&state, &headers(&[(HANDSHAKE_HEADER, "hs-1")]), false)
            .unwrap()
            .unwrap();
        assert_eq!(active.session().handshake_id(), "hs-1");
    }

    #[test]
    fn test_expired_is_handshake_required() {
        let (state, clock) = state(true);
        clock.advance(Duration::from_secs(601));
        let err = require_handshake(&state, &headers(&[(HANDSHAKE_HEADER, "hs-1")]), true)
            .unwrap_err();
        assert!(matches!(err, ServerError::HandshakeRequired));
    }

    #[test]
    fn test_request_origin_resolution() {
        assert_eq!(
            request_origin(&headers(&[("origin", "https://portal.example")])),
            "https://portal.example"
        );
        assert_eq!(
            request_origin(&headers(&[
                ("x-forwarded-proto", "https, http"),
                ("x-forwarded-host", "portal.example"),
                ("host", "backend:8080"),
            ])),
            "https://portal.example"
        );
        assert_eq!(request_origin(&headers(&[("host", "backend:8080")])), "http://backend:8080");
        assert_eq!(request_origin(&HeaderMap::new()), "http://localhost");
    }

    #[test]
    fn test_protect_seals_for_endpoint() {
        let (state, _) = state(false);
        let hdrs = headers(&[(HANDSHAKE_HEADER, "hs-1"), ("origin", "https://portal.example")]);
        let payload = json!({ "settings": { "portal_title": "Portal" } });

        let Protected(envelope) =
            protect(&state, &hdrs, BundleClass::Settings, "settings", &payload, true).unwrap();
        let ResponseEnvelope::Encrypted { class, bundle } = envelope else {
            panic!("expected encrypted envelope");
        };
        assert_eq!(class, BundleClass::Settings);

        let session = state.handshakes.get("hs-1").unwrap();
        let context = PayloadContext::new("hs-1", "https://portal.example", "settings");
        let opened = decrypt(&bundle, session.key(), &context, AadPolicy::Strict).unwrap();
        assert_eq!(opened, payload);
    }

    #[test]
    fn test_protect_plain_when_disabled() {
        let (state, _) = state(false);
        let Protected(envelope) = protect(
            &state,
            &HeaderMap::new(),
            BundleClass::Generic,
            "admin/handshakes",
            &json!({ "active": 1 }),
            false,
        )
        .unwrap();
        assert_eq!(envelope, ResponseEnvelope::Plain(json!({ "active": 1 })));
    }
}
