use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Server-level error type covering all subsystems.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid client public key: {0}")]
    InvalidKey(String),

    /// Missing, unknown or expired handshake id.
    #[error("Handshake required")]
    HandshakeRequired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many handshake requests")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::InvalidKey(_) => {
                (StatusCode::BAD_REQUEST, "Invalid client public key".to_string())
            }
            ServerError::HandshakeRequired => {
                (StatusCode::UPGRADE_REQUIRED, "Handshake required".to_string())
            }
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ServerError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many handshake requests. Please retry shortly.".to_string(),
            ),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message });
        let mut response = (status, axum::Json(body)).into_response();

        if let ServerError::TooManyRequests { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// Convenience alias for server handler results.
pub type Result<T> = std::result::Result<T, ServerError>;
