//! Bounded exponential-backoff retries around a single upstream call.
//!
//! Failures are classified by their message text: anything that looks like a
//! rejected credential aborts at once, everything else is retried after a
//! sleep that doubles per attempt up to a cap.

use async_trait::async_trait;
use log::{ error, warn };
use std::time::Duration;

use crate::error::GatewayError;
use crate::llm::chat::ChatClient;

/// Markers (matched case-insensitively) of a credential or permission failure.
const NON_RETRYABLE_MARKERS: [&str; 4] = ["403", "leaked", "invalid", "permission"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    NonRetryable,
}

pub fn classify_failure(message: &str) -> FailureKind {
    let msg = message.to_lowercase();
    if NON_RETRYABLE_MARKERS.iter().any(|m| msg.contains(m)) {
        FailureKind::NonRetryable
    } else {
        FailureKind::Transient
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff applied before retry number `attempt` (1-based, counting the
    /// attempt that just failed).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Calls `client` until it succeeds, fails non-retryably, or the attempt
/// budget runs out. Returns the trimmed response text.
pub async fn generate_with_retry(
    client: &dyn ChatClient,
    prompt: &str,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<String, GatewayError> {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let err = match client.complete(prompt).await {
            Ok(resp) => return Ok(resp.response.trim().to_string()),
            Err(e) => e.to_string(),
        };

        if classify_failure(&err) == FailureKind::NonRetryable {
            error!("Non-retryable error from generative API: {}", err);
            return Err(GatewayError::NonRetryableUpstream { detail: err });
        }

        if attempt < max_attempts {
            let backoff = policy.backoff_after(attempt);
            warn!(
                "Transient error: {}. Retrying in {:?} (attempt {}/{})...",
                err,
                backoff,
                attempt,
                max_attempts
            );
            sleeper.sleep(backoff).await;
        } else {
            error!("All retries exhausted. Last error: {}", err);
            return Err(GatewayError::RetriesExhausted { attempts: max_attempts, detail: err });
        }
    }

    // The last iteration always returns.
    Err(GatewayError::Internal("retry loop ended without a result".into()))
}
