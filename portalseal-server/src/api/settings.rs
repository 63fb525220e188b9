use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use portalseal_core::codec::BundleClass;
use serde_json::json;

use crate::error::ServerError;
use crate::guard::{protect, Protected};
use crate::state::AppState;

/// GET /api/settings
///
/// Secrets are never returned, only whether each one is configured.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Protected, ServerError> {
    let portal = &state.config.portal;
    let payload = json!({
        "settings": {
            "portal_title": portal.portal_title,
            "local_login_enabled": portal.local_login_enabled,
            "bootstrap_local_only": portal.bootstrap_local_only,
            "auth_encryption_enabled": state.config.encryption_enabled,
            "azure_client_secret": "",
            "azure_client_secret_configured": portal.azure_client_secret_configured,
            "db_password": "",
            "db_password_configured": portal.db_password_configured,
            "uptime_kuma_api_key": "",
            "uptime_kuma_api_key_configured": portal.uptime_kuma_api_key_configured,
            "aps_api_token": "",
            "aps_api_token_configured": portal.aps_api_token_configured,
        }
    });
    protect(&state, &headers, BundleClass::Settings, "settings", &payload, true)
}
