pub mod sqlite;

use async_trait::async_trait;
use clap::ValueEnum;
use log::{ info, error };

use crate::error::{ GatewayError, GatewayResult };
use crate::llm::chat::ChatClient;

pub use sqlite::SqliteResponseCache;

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, question: &str) -> GatewayResult<Option<String>>;

    /// Returns `false` when an entry for `question` already existed.
    async fn insert(&self, question: &str, response: &str) -> GatewayResult<bool>;
}

/// How a question is turned into a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CacheKeyPolicy {
    /// Byte-identical questions only.
    #[default]
    Exact,
    /// Trimmed and lowercased.
    Normalized,
}

impl CacheKeyPolicy {
    pub fn key(&self, question: &str) -> String {
        match self {
            CacheKeyPolicy::Exact => question.to_string(),
            CacheKeyPolicy::Normalized => question.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit(String),
    Miss(String),
}

impl CacheOutcome {
    pub fn into_response(self) -> String {
        match self {
            CacheOutcome::Hit(r) | CacheOutcome::Miss(r) => r,
        }
    }
}

/// Returns the stored answer for `question`, or asks `client` once and stores
/// the result. Upstream failures are returned and nothing is stored.
pub async fn lookup_or_generate(
    cache: &dyn ResponseCache,
    client: &dyn ChatClient,
    question: &str,
    policy: CacheKeyPolicy,
) -> GatewayResult<CacheOutcome> {
    let key = policy.key(question);
    if let Some(stored) = cache.get(&key).await? {
        info!("Cache hit for question ({} chars)", key.len());
        return Ok(CacheOutcome::Hit(stored));
    }

    info!("Cache miss for question ({} chars); calling model", key.len());
    let response = match client.complete(question).await {
        Ok(resp) => resp.response.trim().to_string(),
        Err(e) => {
            error!("Generative API call failed on cache miss: {}", e);
            return Err(GatewayError::Upstream { detail: e.to_string() });
        }
    };

    cache.insert(&key, &response).await?;
    Ok(CacheOutcome::Miss(response))
}
