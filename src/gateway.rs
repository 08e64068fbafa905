use log::info;
use std::sync::Arc;

use crate::cache::{ lookup_or_generate, CacheKeyPolicy, CacheOutcome, ResponseCache };
use crate::error::GatewayResult;
use crate::history::format_history_for_prompt;
use crate::llm::chat::ChatClient;
use crate::models::chat::ConversationTurn;
use crate::retry::{ generate_with_retry, RetryPolicy, Sleeper };

/// History in, flattened prompt, bounded retries.
#[derive(Clone)]
pub struct RetryingGateway {
    client: Arc<dyn ChatClient>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingGateway {
    pub fn new(client: Arc<dyn ChatClient>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { client, policy, sleeper }
    }

    pub async fn reply(&self, history: &[ConversationTurn]) -> GatewayResult<String> {
        info!("Received submit request. History length: {}", history.len());
        let prompt = format_history_for_prompt(history);
        generate_with_retry(self.client.as_ref(), &prompt, &self.policy, self.sleeper.as_ref()).await
    }
}

/// Single message in, answered from the cache or by one model call.
#[derive(Clone)]
pub struct CachedGateway {
    client: Arc<dyn ChatClient>,
    cache: Arc<dyn ResponseCache>,
    key_policy: CacheKeyPolicy,
}

impl CachedGateway {
    pub fn new(
        client: Arc<dyn ChatClient>,
        cache: Arc<dyn ResponseCache>,
        key_policy: CacheKeyPolicy
    ) -> Self {
        Self { client, cache, key_policy }
    }

    pub async fn reply(&self, message: &str) -> GatewayResult<String> {
        let outcome = lookup_or_generate(
            self.cache.as_ref(),
            self.client.as_ref(),
            message,
            self.key_policy
        ).await?;
        if let CacheOutcome::Miss(_) = &outcome {
            info!("Stored new cache entry");
        }
        Ok(outcome.into_response())
    }
}

#[derive(Clone)]
pub enum Gateway {
    Retrying(RetryingGateway),
    Cached(CachedGateway),
}
