//! Chat Relay - Entry Point
//!
//! Loads configuration, starts the ChatServer actor and accepts connections
//! until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{serve, ChatServer, Config, HandlerSettings};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[derive(Debug, Parser)]
#[command(name = "chat_relay", version, about = "Multi-user TCP chat relay")]
struct Args {
    /// Address to listen on (overrides the config file)
    addr: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    if let Some(addr) = args.addr {
        config.server.bind = addr;
    }
    config.validate()?;

    // Initialize logging with environment filter
    // RUST_LOG takes precedence over the config file,
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    let listener = TcpListener::bind(&config.server.bind).await?;

    let server = ChatServer::start(CHANNEL_BUFFER_SIZE);
    info!("ChatServer actor started");

    let settings = HandlerSettings::from(&config.server);
    tokio::select! {
        _ = serve(listener, server, settings) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
