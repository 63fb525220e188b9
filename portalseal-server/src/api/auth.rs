use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use portalseal_core::codec::BundleClass;
use portalseal_core::handshake::NegotiateRequest;
use serde::Serialize;

use crate::error::ServerError;
use crate::guard::{protect, Protected};
use crate::handshake;
use crate::state::AppState;

/// Login options shown before sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigPayload {
    pub local_login_enabled: bool,
    pub sso_login_enabled: bool,
    pub auth_encryption_enabled: bool,
}

/// Identity claims; nothing beyond these two fields leaves the server.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub email: String,
    pub name: String,
}

/// POST /api/auth/handshake
///
/// Body `{"clientPublicKey": base64(SPKI DER)}`.
pub async fn negotiate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NegotiateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let response = handshake::negotiate(&state, &request)?;
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(response)))
}

/// GET /api/auth/config
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Protected, ServerError> {
    let portal = &state.config.portal;
    let payload = AuthConfigPayload {
        local_login_enabled: portal.bootstrap_local_only || portal.local_login_enabled,
        sso_login_enabled: !portal.bootstrap_local_only,
        auth_encryption_enabled: state.config.encryption_enabled,
    };
    protect(&state, &headers, BundleClass::Config, "auth/config", &payload, true)
}

/// GET /api/auth/me
///
/// Identity comes from the upstream auth proxy headers.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Protected, ServerError> {
    let claim = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let email = claim("x-auth-request-email").ok_or(ServerError::Unauthorized)?;
    let name = claim("x-auth-request-user").unwrap_or_else(|| email.clone());

    protect(
        &state,
        &headers,
        BundleClass::User,
        "auth/me",
        &UserPayload { email, name },
        true,
    )
}
