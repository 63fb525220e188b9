use portalseal_client::{ApiRequest, ClientConfig, ProtectedClient};

/// Fetch a protected endpoint and print the decrypted JSON.
pub async fn run_get(path: &str, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let client = ProtectedClient::connect(config)?;
    let value = client.fetch(&ApiRequest::get(path)).await?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
