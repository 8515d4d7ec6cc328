//! Shared response handling for the REST clients.

use crate::error::GenAiError;

/// Header carrying the API key.
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// Ensure the response has a success status code. Returns the response
/// unchanged on success; 429 maps to [`GenAiError::QuotaExceeded`], any
/// other failure to [`GenAiError::Api`] with the body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GenAiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GenAiError::QuotaExceeded { body });
    }
    Err(GenAiError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Parse a successful JSON response body.
pub(crate) async fn parse_response(
    response: reqwest::Response,
) -> Result<serde_json::Value, GenAiError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<serde_json::Value>().await?)
}
