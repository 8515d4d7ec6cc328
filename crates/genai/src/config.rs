use std::time::Duration;

/// Generation capability configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// API key for the Generative Language API. `None` disables live calls.
    pub api_key: Option<String>,
    /// REST base URL, without a trailing slash.
    pub base_url: String,
    /// Image model used for reference images.
    pub image_model: String,
    /// Text model used for structured character sheets.
    pub text_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GenAiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                                             |
    /// |----------------------|-----------------------------------------------------|
    /// | `GEMINI_API_KEY`     | (none)                                              |
    /// | `GENAI_BASE_URL`     | `https://generativelanguage.googleapis.com/v1beta`  |
    /// | `IMAGE_MODEL`        | `imagen-3.0-generate-002`                           |
    /// | `TEXT_MODEL`         | `gemini-1.5-flash`                                  |
    /// | `GENAI_TIMEOUT_SECS` | `120`                                               |
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into())
            .trim_end_matches('/')
            .to_string();

        let image_model =
            std::env::var("IMAGE_MODEL").unwrap_or_else(|_| "imagen-3.0-generate-002".into());

        let text_model = std::env::var("TEXT_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into());

        let timeout_secs: u64 = std::env::var("GENAI_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("GENAI_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            base_url,
            image_model,
            text_model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Build the shared HTTP client for both capabilities.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }
}
