pub mod admin;
pub mod auth;
pub mod settings;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{encrypt, rate_limit};
use crate::state::AppState;

/// Build the Axum router with all API routes, CORS, and tracing middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route(
            "/handshake",
            post(auth::negotiate).route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::limit_handshakes,
            )),
        )
        .route("/config", get(auth::get_config))
        .route("/me", get(auth::get_me));

    // Generic routes: handlers return plain JSON, the middleware seals it.
    let generic_routes = Router::new()
        .route("/api/admin/handshakes", get(admin::handshake_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            encrypt::encrypt_response,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/settings", get(settings::get_settings))
        .merge(generic_routes)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
