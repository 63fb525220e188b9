use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use portalseal_server::{api, session, AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portalseal_server=info,tower_http=info")),
        )
        .init();

    tracing::info!("portal server starting...");

    // Load .env file if present (non-fatal if missing).
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    let config = Config::from_env();
    tracing::info!(
        http_port = config.http_port,
        encryption_enabled = config.encryption_enabled,
        kid = %config.kid,
        handshake_ttl_secs = config.handshake_ttl.as_secs(),
        "configuration loaded"
    );

    let http_port = config.http_port;
    let state = Arc::new(AppState::new(config));
    let _sweeper = session::spawn_sweeper(state.clone());

    let router = api::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind HTTP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "HTTP listener running");

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "Axum server error");
        std::process::exit(1);
    }
}
