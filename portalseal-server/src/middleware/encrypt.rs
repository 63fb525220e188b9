use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{OriginalUri, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use portalseal_core::codec::{endpoint_from_path, BundleClass, ResponseEnvelope};
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::guard::require_handshake;
use crate::state::AppState;

/// Largest handler body the middleware will buffer for wrapping.
const MAX_WRAPPED_BODY: usize = 2 * 1024 * 1024;

/// Wrap successful JSON responses of generic routes as `{"enc": bundle}`.
///
/// The handshake is checked before the handler runs, so a stale session
/// never reaches it. Non-2xx responses and bodies that are already envelopes
/// pass through untouched.
pub async fn encrypt_response(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let endpoint = endpoint_from_path(&path);

    let Some(active) = require_handshake(&state, request.headers(), false)? else {
        return Ok(next.run(request).await);
    };

    let response = next.run(request).await;
    if !response.status().is_success() || !is_json(&response) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, MAX_WRAPPED_BODY)
        .await
        .map_err(|e| ServerError::Internal(format!("read response body: {e}")))?;

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return Ok(Response::from_parts(parts, Body::from(bytes))),
    };

    let data = match ResponseEnvelope::classify(value) {
        ResponseEnvelope::Plain(data) => data,
        ResponseEnvelope::Encrypted { .. } => {
            return Ok(Response::from_parts(parts, Body::from(bytes)));
        }
    };

    let envelope = active.seal(&state, BundleClass::Generic, &endpoint, &json!({ "data": data }))?;
    let body = serde_json::to_vec(&envelope)
        .map_err(|e| ServerError::Internal(format!("serialize envelope: {e}")))?;

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    tracing::trace!(%endpoint, handshake_id = %active.session().handshake_id(), "wrapped response");
    Ok(Response::from_parts(parts, Body::from(body)))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
