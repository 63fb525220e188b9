use portalseal_client::{ClientConfig, ProtectedClient};

/// Negotiate a handshake and print its id and key version.
pub async fn run_negotiate(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Negotiating with {}...", config.base_url);

    let client = ProtectedClient::connect(config)?;
    let session = client.manager().ensure(true).await?;

    println!("handshake_id: {}", session.handshake_id());
    println!("kid:          {}", session.kid());
    Ok(())
}
