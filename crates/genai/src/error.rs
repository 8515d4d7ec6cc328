/// Errors from the external generation capabilities.
///
/// These are surfaced to callers unchanged. Only [`GenAiError::QuotaExceeded`]
/// is ever retried, and only by the orchestrator's backoff policy.
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider rejected the call for quota or rate reasons (HTTP 429).
    #[error("Quota exceeded: {body}")]
    QuotaExceeded {
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider answered, but not with what was asked for.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No API key is configured.
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

impl GenAiError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}
