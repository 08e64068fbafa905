//! Resolved runtime configuration.
//!
//! `Args` holds what was passed on the command line or set through the
//! single-name env vars clap knows about. Settings with several candidate env
//! names (credential, model) are resolved here, with an injectable lookup so
//! precedence can be tested without touching the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheKeyPolicy;
use crate::cli::{ Args, ServiceMode };
use crate::error::{ GatewayError, GatewayResult };
use crate::llm::{ LlmConfig, LlmType };
use crate::retry::RetryPolicy;

/// Env vars consulted for the API key, highest precedence first.
pub const API_KEY_VARS: [&str; 3] = ["GENAI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Env vars consulted for the model name, highest precedence first.
pub const MODEL_VARS: [&str; 2] = ["GENAI_MODEL", "MODEL"];

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: ServiceMode,
    pub listen_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub llm: LlmConfig,
    pub retry: RetryPolicy,
    pub cache_db: PathBuf,
    pub cache_key_policy: CacheKeyPolicy,
}

fn first_non_empty<F>(explicit: Option<&str>, vars: &[&str], lookup: &F) -> Option<String>
    where F: Fn(&str) -> Option<String>
{
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(vars.iter().filter_map(|&v| lookup(v)))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

impl GatewayConfig {
    pub fn from_env(args: &Args) -> GatewayResult<Self> {
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    pub fn resolve<F>(args: &Args, lookup: F) -> GatewayResult<Self>
        where F: Fn(&str) -> Option<String>
    {
        let api_key = first_non_empty(args.api_key.as_deref(), &API_KEY_VARS, &lookup).ok_or_else(||
            GatewayError::Config(
                "GENAI API key not set. Set GENAI_API_KEY (or GOOGLE_API_KEY / API_KEY) in the environment or a .env file.".into()
            )
        )?;

        let model = first_non_empty(args.model.as_deref(), &MODEL_VARS, &lookup).unwrap_or_else(||
            args.mode.default_model().to_string()
        );

        let llm_type: LlmType = args.chat_llm_type
            .parse()
            .map_err(|e| GatewayError::Config(format!("{}", e)))?;

        let port = args.port.unwrap_or_else(|| args.mode.default_port());
        let listen_addr = format!("{}:{}", args.host, port)
            .parse::<SocketAddr>()
            .map_err(|e| GatewayError::Config(format!("Invalid listen address '{}:{}': {}", args.host, port, e)))?;

        let initial_backoff = Duration::from_secs(args.initial_backoff_secs);
        let max_backoff = Duration::from_secs(args.max_backoff_secs).max(initial_backoff);

        Ok(Self {
            mode: args.mode,
            listen_addr,
            static_dir: PathBuf::from(&args.static_dir),
            cert_path: PathBuf::from(&args.cert_path),
            key_path: PathBuf::from(&args.key_path),
            llm: LlmConfig {
                llm_type,
                api_key: Some(api_key),
                completion_model: Some(model),
                base_url: args.base_url.clone().filter(|u| !u.trim().is_empty()),
            },
            retry: RetryPolicy {
                max_attempts: args.max_attempts.max(1),
                initial_backoff,
                max_backoff,
            },
            cache_db: PathBuf::from(&args.cache_db),
            cache_key_policy: args.cache_key_policy,
        })
    }

    pub fn model(&self) -> &str {
        self.llm.completion_model.as_deref().unwrap_or_else(|| self.mode.default_model())
    }

    /// Both TLS files exist next to the process.
    pub fn tls_available(&self) -> bool {
        self.cert_path.is_file() && self.key_path.is_file()
    }
}
