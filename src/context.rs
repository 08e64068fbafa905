use log::info;
use std::sync::Arc;

use crate::cache::SqliteResponseCache;
use crate::cli::ServiceMode;
use crate::config::GatewayConfig;
use crate::error::{ GatewayError, GatewayResult };
use crate::gateway::{ CachedGateway, Gateway, RetryingGateway };
use crate::llm::chat::{ new_client as new_chat_client, ChatClient };
use crate::retry::TokioSleeper;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GatewayConfig>,
    pub gateway: Gateway,
}

impl AppContext {
    pub fn new(config: GatewayConfig, gateway: Gateway) -> Self {
        Self { config: Arc::new(config), gateway }
    }
}

/// Builds the chat client and, in cached mode, opens the store and creates
/// its schema.
pub async fn initialize(config: GatewayConfig) -> GatewayResult<AppContext> {
    let chat_client: Arc<dyn ChatClient> = new_chat_client(&config.llm).map_err(|e|
        GatewayError::Config(format!("Failed to create chat client: {}", e))
    )?;
    info!(
        "Chat client configured: Type={}, Model={}, BaseURL={:?}",
        config.llm.llm_type,
        chat_client.get_model(),
        chat_client.get_base_url().as_deref().unwrap_or("adapter default")
    );

    let gateway = match config.mode {
        ServiceMode::Retry => {
            info!(
                "Retry policy: max_attempts={}, initial_backoff={:?}, max_backoff={:?}",
                config.retry.max_attempts,
                config.retry.initial_backoff,
                config.retry.max_backoff
            );
            Gateway::Retrying(
                RetryingGateway::new(chat_client, config.retry.clone(), Arc::new(TokioSleeper))
            )
        }
        ServiceMode::Cached => {
            info!(
                "Opening response cache at {} (key policy: {:?})",
                config.cache_db.display(),
                config.cache_key_policy
            );
            let cache = SqliteResponseCache::open(&config.cache_db).await?;
            Gateway::Cached(CachedGateway::new(chat_client, Arc::new(cache), config.cache_key_policy))
        }
    };

    Ok(AppContext::new(config, gateway))
}
