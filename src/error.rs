use thiserror::Error;

/// Failures surfaced by the gateway strategies and their HTTP boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Upstream rejected the request in a way retrying cannot fix
    /// (bad, leaked or revoked credential).
    #[error("Generative API error: {detail}")]
    NonRetryableUpstream { detail: String },

    /// Every attempt failed with a transient error.
    #[error("Generative API failed after {attempts} attempts: {detail}")]
    RetriesExhausted { attempts: u32, detail: String },

    /// A single, non-retried upstream call failed.
    #[error("Generative API error: {detail}")]
    Upstream { detail: String },

    #[error("Response cache error: {0}")]
    Cache(#[from] tokio_rusqlite::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// True for failures caused by the caller rather than the gateway.
    pub fn is_client_error(&self) -> bool {
        matches!(self, GatewayError::InvalidRequest(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
