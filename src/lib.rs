pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod cache;
pub mod context;
pub mod error;
pub mod gateway;
pub mod retry;

use cli::Args;
use config::GatewayConfig;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = GatewayConfig::from_env(&args)?;

    info!("--- Core Configuration ---");
    info!("Mode: {}", config.mode);
    info!("Listen Address: {}", config.listen_addr);
    info!("Chat LLM Type: {}", config.llm.llm_type);
    info!("Model: {}", config.model());
    info!("API Key Present: {}", if config.llm.api_key.is_some() { "yes" } else { "no" });
    info!("Static Dir: {}", config.static_dir.display());
    info!("TLS Available: {}", config.tls_available());
    if config.mode == cli::ServiceMode::Cached {
        info!("Cache DB: {}", config.cache_db.display());
        info!("Cache Key Policy: {:?}", config.cache_key_policy);
    }
    info!("-------------------------");

    let ctx = context::initialize(config).await?;
    Server::new(ctx).run().await?;

    Ok(())
}
