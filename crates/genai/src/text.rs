//! Structured text generation capability and the Gemini client.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::GenAiConfig;
use crate::error::GenAiError;
use crate::http::{parse_response, API_KEY_HEADER};

/// "Given instructions and a prompt, return a JSON document."
///
/// Implementations must fail rather than return prose.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_structured(
        &self,
        system_instructions: &str,
        user_prompt: &str,
    ) -> Result<Value, GenAiError>;
}

/// HTTP client for the Gemini `models/{model}:generateContent` endpoint,
/// configured for JSON output.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: &GenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.text_model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_structured(
        &self,
        system_instructions: &str,
        user_prompt: &str,
    ) -> Result<Value, GenAiError> {
        let api_key = self.api_key.as_deref().ok_or(GenAiError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&build_generate_body(system_instructions, user_prompt))
            .send()
            .await?;

        let body = parse_response(response).await?;
        let text = extract_text(&body)?;
        parse_json_text(&text)
    }
}

/// Build the `generateContent` request body with JSON output enforced.
pub fn build_generate_body(system_instructions: &str, user_prompt: &str) -> Value {
    json!({
        "systemInstruction": {"parts": [{"text": system_instructions}]},
        "contents": [{"role": "user", "parts": [{"text": user_prompt}]}],
        "generationConfig": {"responseMimeType": "application/json"},
    })
}

/// Concatenate the text parts of the first candidate.
pub fn extract_text(body: &Value) -> Result<String, GenAiError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| GenAiError::InvalidResponse("response has no candidate content".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(GenAiError::InvalidResponse("response contained no text".into()));
    }
    Ok(text)
}

/// Parse model output strictly as JSON.
pub fn parse_json_text(text: &str) -> Result<Value, GenAiError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        tracing::warn!(error = %e, raw = %text, "Model returned non-JSON output");
        GenAiError::InvalidResponse(format!("model output is not valid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn generate_body_requests_json() {
        let body = build_generate_body("be terse", "a rogue");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a rogue");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn text_parts_are_joined() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"text": "{\"name\": "},
            {"text": "\"Kaelen\"}"}
        ]}}]});
        let text = extract_text(&body).unwrap();
        assert_eq!(parse_json_text(&text).unwrap(), json!({"name": "Kaelen"}));
    }

    #[test]
    fn missing_candidates_fail() {
        assert_matches!(extract_text(&json!({})), Err(GenAiError::InvalidResponse(_)));
        assert_matches!(
            extract_text(&json!({"candidates": [{"content": {"parts": [{"text": " "}]}}]})),
            Err(GenAiError::InvalidResponse(_))
        );
    }

    #[test]
    fn prose_is_rejected() {
        assert_matches!(
            parse_json_text("Sure! Here is your character: {}"),
            Err(GenAiError::InvalidResponse(_))
        );
    }
}
