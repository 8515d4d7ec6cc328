//! Provider throttling between reference calls.
//!
//! Two mechanisms: a fixed pause between consecutive generation calls, and
//! an exponential backoff that applies only when the provider explicitly
//! reports an exhausted quota. Every other failure is returned at once.

use std::future::Future;
use std::time::Duration;

use move37_genai::GenAiError;

/// Throttling configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Pause inserted between consecutive generation calls.
    pub pause_between_calls: Duration,
    /// Retries after a quota-exceeded response before giving up.
    pub max_quota_retries: u32,
    /// Delay before the first quota retry; doubles on each further retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            pause_between_calls: Duration::from_secs(5),
            max_quota_retries: 3,
            initial_backoff: Duration::from_millis(2_000),
            max_backoff: Duration::from_millis(30_000),
        }
    }
}

impl ThrottlePolicy {
    /// No pauses and no retries.
    pub fn disabled() -> Self {
        Self {
            pause_between_calls: Duration::ZERO,
            max_quota_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Load the policy from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `REFERENCE_PAUSE_SECS` | `5`     |
    /// | `QUOTA_MAX_RETRIES`    | `3`     |
    /// | `QUOTA_BACKOFF_MS`     | `2000`  |
    /// | `QUOTA_MAX_BACKOFF_MS` | `30000` |
    pub fn from_env() -> Self {
        let pause_secs: u64 = std::env::var("REFERENCE_PAUSE_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("REFERENCE_PAUSE_SECS must be a valid u64");

        let max_quota_retries: u32 = std::env::var("QUOTA_MAX_RETRIES")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("QUOTA_MAX_RETRIES must be a valid u32");

        let backoff_ms: u64 = std::env::var("QUOTA_BACKOFF_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("QUOTA_BACKOFF_MS must be a valid u64");

        let max_backoff_ms: u64 = std::env::var("QUOTA_MAX_BACKOFF_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .expect("QUOTA_MAX_BACKOFF_MS must be a valid u64");

        Self {
            pause_between_calls: Duration::from_secs(pause_secs),
            max_quota_retries,
            initial_backoff: Duration::from_millis(backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Delay before quota retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Sleep for the inter-call pause, if any.
    pub async fn pause(&self) {
        if !self.pause_between_calls.is_zero() {
            tracing::debug!(
                pause_ms = self.pause_between_calls.as_millis() as u64,
                "Pausing between generation calls"
            );
            tokio::time::sleep(self.pause_between_calls).await;
        }
    }

    /// Run `call`, retrying with backoff only on quota-exceeded errors.
    ///
    /// When retries run out the last quota error is returned unchanged.
    pub async fn call_with_backoff<T, F, Fut>(&self, mut call: F) -> Result<T, GenAiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenAiError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(err) if err.is_quota_exceeded() && attempt < self.max_quota_retries => {
                    attempt += 1;
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_quota_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Provider quota exceeded, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
