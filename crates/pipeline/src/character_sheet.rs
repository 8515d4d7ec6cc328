//! Free-text to character sheet conversion through the text capability.

use serde_json::Value;

use move37_core::error::CoreError;
use move37_genai::{GenAiError, TextGenerator};

use crate::error::PipelineError;

/// Instructions sent with every character sheet request.
pub const CHARACTER_SHEET_INSTRUCTIONS: &str = r#"You design characters for film and animation.
Turn the user's description into one JSON object with exactly these fields:
{
  "character_id": "string, empty or a short code such as c_003",
  "name": "string",
  "physical_traits": {
    "age_range": "string",
    "hair": "string",
    "eyes": "string",
    "physique": "string"
  },
  "style_id": "string, an existing style such as cyberpunk_v1, ghibli_esque, claymation, hyper_real or noir, or a new one",
  "clothing": "string, the full outfit",
  "extra_details": "string, tattoos, scars, accessories and other identifying marks",
  "negative_prompt": "string, comma separated things image generation must avoid"
}
Expand brief descriptions into a complete, vivid sheet.
Answer with the JSON object only."#;

/// Fields the model must not author: reference paths only come from real
/// generation runs.
const GENERATED_ONLY_FIELDS: &[&str] = &["reference_images", "reference_images_version"];

/// Ask the text capability for a character sheet matching `prompt`.
///
/// The result is a JSON object in the character record layout, ready to be
/// edited and saved under `characters/`.
pub async fn generate_character_sheet(
    text: &dyn TextGenerator,
    prompt: &str,
) -> Result<Value, PipelineError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(CoreError::InvalidArgument("prompt must not be empty".into()).into());
    }

    tracing::info!(prompt_len = prompt.len(), "Generating character sheet");
    let mut sheet = text
        .generate_structured(CHARACTER_SHEET_INSTRUCTIONS, prompt)
        .await?;

    let Some(fields) = sheet.as_object_mut() else {
        return Err(GenAiError::InvalidResponse(
            "character sheet must be a JSON object".into(),
        )
        .into());
    };
    for field in GENERATED_ONLY_FIELDS {
        fields.remove(*field);
    }

    let name = fields.get("name").and_then(Value::as_str).unwrap_or("");
    tracing::info!(name, "Character sheet generated");
    Ok(sheet)
}
