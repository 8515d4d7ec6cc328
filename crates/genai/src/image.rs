//! Image generation capability and the Imagen `:predict` client.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use move37_core::reference::AspectRatio;
use serde_json::{json, Value};

use crate::config::GenAiConfig;
use crate::error::GenAiError;
use crate::http::{parse_response, API_KEY_HEADER};

/// One image-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Number of images to return.
    pub count: u32,
    pub aspect_ratio: AspectRatio,
    pub negative_prompt: Option<String>,
}

/// One generated image.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// "Given a prompt and a count, return that many images."
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, GenAiError>;
}

// ---------------------------------------------------------------------------
// Imagen client
// ---------------------------------------------------------------------------

/// HTTP client for the Imagen `models/{model}:predict` endpoint.
pub struct ImagenClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ImagenClient {
    pub fn new(client: reqwest::Client, config: &GenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.image_model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, GenAiError> {
        let api_key = self.api_key.as_deref().ok_or(GenAiError::MissingApiKey)?;

        tracing::debug!(
            model = %self.model,
            count = request.count,
            aspect_ratio = request.aspect_ratio.as_str(),
            "Requesting images"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&build_predict_body(request))
            .send()
            .await?;

        let body = parse_response(response).await?;
        let images = parse_predictions(&body)?;
        tracing::debug!(model = %self.model, returned = images.len(), "Images received");
        Ok(images)
    }
}

/// Build the `:predict` request body.
pub fn build_predict_body(request: &ImageRequest) -> Value {
    let mut parameters = json!({
        "sampleCount": request.count,
        "aspectRatio": request.aspect_ratio.as_str(),
        "addWatermark": false,
        "safetySetting": "block_only_high",
        "personGeneration": "allow_all",
        "outputOptions": {"mimeType": "image/jpeg"},
    });
    if let Some(negative) = request
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        parameters["negativePrompt"] = json!(negative);
    }

    json!({
        "instances": [{"prompt": request.prompt}],
        "parameters": parameters,
    })
}

/// Decode the `predictions` array of a `:predict` response.
///
/// Filtered predictions (no image bytes) are dropped; a response with no
/// images at all is an error.
pub fn parse_predictions(body: &Value) -> Result<Vec<GeneratedImage>, GenAiError> {
    let predictions = body
        .get("predictions")
        .and_then(Value::as_array)
        .ok_or_else(|| GenAiError::InvalidResponse("response has no predictions".into()))?;

    let mut images = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let Some(encoded) = prediction.get("bytesBase64Encoded").and_then(Value::as_str) else {
            let reason = prediction
                .get("raiFilteredReason")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            tracing::warn!(reason, "Prediction without image bytes");
            continue;
        };
        let bytes = general_purpose::STANDARD.decode(encoded).map_err(|e| {
            GenAiError::InvalidResponse(format!("invalid base64 image payload: {e}"))
        })?;
        let mime_type = prediction
            .get("mimeType")
            .and_then(Value::as_str)
            .unwrap_or("image/png")
            .to_string();
        images.push(GeneratedImage { bytes, mime_type });
    }

    if images.is_empty() {
        return Err(GenAiError::InvalidResponse("response contained no images".into()));
    }
    Ok(images)
}
