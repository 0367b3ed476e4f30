//! Memory Assistant HTTP server

use clap::Parser;
use memory_assistant::config::{validate_config, Config};
use memory_assistant::database::open_index;
use memory_assistant::gateway::{serve, AppState};
use memory_assistant::logging::init_tracing;
use memory_assistant::memory::{build_embedder, MemoryService};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "memory-assistant-server", version = memory_assistant::VERSION, about = "Memory Assistant HTTP API")]
struct Args {
    /// Port to listen on (overrides GATEWAY_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind to (overrides GATEWAY_BIND)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }

    init_tracing(&config.log);
    info!("Starting Memory Assistant v{}", memory_assistant::VERSION);

    for issue in validate_config(&config).into_result()? {
        warn!("{}", issue);
    }

    let embedder = build_embedder(&config.embedding).await?;
    let index = open_index(&config).await?;
    let service = MemoryService::new(embedder, index, config.recall.clone())?;

    let state = AppState::new(service, config.gateway.auth.api_key.clone());
    serve(&config.gateway, state).await?;

    Ok(())
}
