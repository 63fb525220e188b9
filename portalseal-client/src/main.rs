mod commands;

use clap::{Args, Parser, Subcommand};
use portalseal_client::ClientConfig;
use portalseal_core::codec::AadPolicy;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portalseal", about = "Negotiate handshakes and read encrypted portal endpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServerArgs {
    /// Portal base URL, e.g. http://localhost:8080
    #[arg(long, env = "PORTALSEAL_SERVER")]
    server: String,

    /// Origin bound into the AAD. Defaults to the origin of --server.
    #[arg(long)]
    origin: Option<String>,

    /// Reject bundles sealed without endpoint binding
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Negotiate a fresh handshake and print its id
    Negotiate {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Fetch a protected endpoint and print the decrypted payload
    Get {
        /// Request path, e.g. /api/settings
        path: String,

        #[command(flatten)]
        server: ServerArgs,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (controlled by RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Negotiate { server } => match client_config(server) {
            Ok(config) => commands::negotiate::run_negotiate(config).await,
            Err(e) => Err(e),
        },
        Commands::Get { path, server } => match client_config(server) {
            Ok(config) => commands::get::run_get(&path, config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn client_config(args: ServerArgs) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::new(&args.server)?;
    if let Some(origin) = args.origin {
        config = config.with_origin(origin);
    }
    if args.strict {
        config = config.with_aad_policy(AadPolicy::Strict);
    }
    Ok(config)
}
