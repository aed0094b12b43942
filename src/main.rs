use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use todod::agent::{gemini::GeminiResolver, resolver::UnconfiguredResolver, Agent, Resolver};
use todod::config::ServerConfig;
use todod::rest;
use todod::storage::TaskStore;
use todod::AppContext;

#[derive(Parser)]
#[command(
    name = "todod",
    about = "todod — always-on todo service with a conversational agent front",
    version
)]
struct Args {
    /// HTTP port
    #[arg(long, env = "TODOD_PORT")]
    port: Option<u16>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TODOD_BIND")]
    bind: Option<String>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "TODOD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TODOD_LOG")]
    log: Option<String>,

    /// Config file path (default: {data_dir}/config.toml)
    #[arg(long, env = "TODOD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(ServerConfig::new(
        args.port,
        args.bind,
        args.data_dir,
        args.log,
        args.config,
    ));

    tracing_subscriber::fmt()
        .with_env_filter(config.log.clone())
        .compact()
        .init();

    let store = TaskStore::open(&config.db_path()).await?;
    info!("task store ready at {}", config.db_path().display());

    let resolver: Box<dyn Resolver> = match &config.agent_credential {
        Some(credential) => {
            info!(
                model = %config.agent_model,
                vertex = config.agent_use_vertex,
                "agent resolver configured"
            );
            Box::new(GeminiResolver::new(
                &config.agent_model,
                config.agent_use_vertex,
                credential,
            )?)
        }
        None => {
            warn!("no agent credential configured — /agent/chat will answer with a setup hint");
            Box::new(UnconfiguredResolver)
        }
    };
    let agent = Arc::new(Agent::new(store.clone(), resolver));

    let ctx = AppContext::new(config, store, agent);
    rest::start_rest_server(ctx).await
}
