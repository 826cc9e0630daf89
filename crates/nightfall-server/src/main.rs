//! Nightfall server binary.
//!
//! # Usage
//!
//! ```bash
//! # Development: bind on the PORT env var (default 8080), any origin
//! nightfall-server
//!
//! # Production: explicit bind and origin allow-list
//! nightfall-server --bind 0.0.0.0:8080 \
//!     --allowed-origin https://play.example.com --production
//! ```

use clap::Parser;
use nightfall_server::{Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Nightfall game server
#[derive(Parser, Debug)]
#[command(name = "nightfall-server")]
#[command(about = "Authoritative room server for Nightfall")]
#[command(version)]
struct Args {
    /// Address to bind to; defaults to 0.0.0.0 on the PORT env var
    #[arg(short, long)]
    bind: Option<String>,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "allowed-origin")]
    allowed_origins: Vec<String>,

    /// Enforce the production origin policy
    #[arg(long)]
    production: bool,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let bind_address = args.bind.unwrap_or_else(|| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        format!("0.0.0.0:{port}")
    });

    tracing::info!("Nightfall server starting");

    let config = ServerConfig {
        bind_address,
        max_connections: args.max_connections,
        allowed_origins: args.allowed_origins,
        production: args.production,
    };

    let server = Server::bind(config).await?;
    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
