use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/admin/handshakes
///
/// Plain JSON; the encrypting middleware wraps it.
pub async fn handshake_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "active_handshakes": state.handshakes.len(),
        "ttl_secs": state.handshakes.ttl().as_secs(),
        "kid": state.config.kid,
    }))
}
