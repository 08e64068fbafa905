use clap::{ Parser, ValueEnum };
use std::fmt;

use crate::cache::CacheKeyPolicy;

/// Which request-handling strategy the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceMode {
    /// Conversation history in, bounded retries with exponential backoff.
    Retry,
    /// Single message in, exact-match SQLite cache in front of one model call.
    Cached,
}

impl ServiceMode {
    pub fn default_port(&self) -> u16 {
        match self {
            ServiceMode::Retry => 10000,
            ServiceMode::Cached => 5001,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ServiceMode::Retry => "gemini-2.5-flash",
            ServiceMode::Cached => "gemini-1.5-flash",
        }
    }

    /// Page served at `/`, relative to the static directory.
    pub fn index_page(&self) -> &'static str {
        match self {
            ServiceMode::Retry => "index.html",
            ServiceMode::Cached => "chat.html",
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceMode::Retry => write!(f, "retry"),
            ServiceMode::Cached => write!(f, "cached"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Request-handling strategy (retry, cached)
    #[arg(long, env = "GATEWAY_MODE", value_enum, default_value = "retry")]
    pub mode: ServiceMode,

    // --- Server Args ---
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. Defaults to 10000 (retry) or 5001 (cached).
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding the chat UI pages (index.html, chat.html).
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: String,

    /// TLS certificate (PEM). HTTPS is enabled only if this and --key-path both exist.
    #[arg(long, env = "TLS_CERT_PATH", default_value = "cert.pem")]
    pub cert_path: String,

    /// TLS private key (PEM).
    #[arg(long, env = "TLS_KEY_PATH", default_value = "key.pem")]
    pub key_path: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (gemini)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// API key. Falls back to GENAI_API_KEY, GOOGLE_API_KEY, then API_KEY.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model name. Falls back to GENAI_MODEL, MODEL, then the mode default.
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the generative-language API.
    #[arg(long, env = "GENAI_BASE_URL")]
    pub base_url: Option<String>,

    // --- Retry Args ---
    /// Maximum number of upstream attempts per request (retry mode).
    #[arg(long, env = "GENAI_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Sleep before the first retry, in seconds. Doubles per retry.
    #[arg(long, env = "GENAI_INITIAL_BACKOFF_SECS", default_value = "1")]
    pub initial_backoff_secs: u64,

    /// Upper bound for the retry sleep, in seconds.
    #[arg(long, env = "GENAI_MAX_BACKOFF_SECS", default_value = "10")]
    pub max_backoff_secs: u64,

    // --- Caching Args ---
    /// SQLite file backing the response cache (cached mode).
    #[arg(long, env = "CACHE_DB_PATH", default_value = "simple_chat.db")]
    pub cache_db: String,

    /// How questions become cache keys (exact, normalized).
    #[arg(long, env = "CACHE_KEY_POLICY", value_enum, default_value = "exact")]
    pub cache_key_policy: CacheKeyPolicy,
}
