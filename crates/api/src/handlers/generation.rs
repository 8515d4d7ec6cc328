//! Handlers for reference generation and character sheet generation.

use axum::extract::State;
use axum::Json;
use indexmap::IndexMap;
use move37_pipeline::character_sheet::generate_character_sheet;
use move37_pipeline::{CharacterReferenceRequest, ReferencePaths, RenderedSheet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /generate/character`.
#[derive(Debug, Deserialize)]
pub struct GenerateCharacterRequest {
    pub id: String,
    #[serde(default)]
    pub style_id: Option<String>,
    #[serde(default)]
    pub force: bool,
    #[serde(default = "default_variant_count")]
    pub variant_count: u32,
    /// Restrict the run to one angle.
    #[serde(default)]
    pub angle: Option<String>,
}

fn default_variant_count() -> u32 {
    1
}

/// Body of `POST /generate/environment`.
#[derive(Debug, Deserialize)]
pub struct GenerateEnvironmentRequest {
    pub id: String,
    #[serde(default)]
    pub force: bool,
}

/// Body of `POST /generate/character-json`.
#[derive(Debug, Deserialize)]
pub struct GenerateCharacterJsonRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CharacterReferencesResponse {
    pub id: String,
    pub reference_images: IndexMap<String, ReferencePaths>,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentReferencesResponse {
    pub id: String,
    pub reference_images: IndexMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct BatchRenderResponse {
    pub rendered_assets: Vec<RenderedSheet>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /generate/character
///
/// Generate (or reuse) a character's reference images for one style and
/// record them in the character sidecar.
pub async fn generate_character(
    State(state): State<AppState>,
    Json(input): Json<GenerateCharacterRequest>,
) -> AppResult<Json<DataResponse<CharacterReferencesResponse>>> {
    let request = CharacterReferenceRequest {
        character_id: input.id.trim().to_string(),
        style_id: input.style_id,
        force: input.force,
        variant_count: input.variant_count,
        target_angle: input.angle,
    };

    let reference_images = state
        .references
        .generate_character_references(&request)
        .await?;

    Ok(Json(DataResponse {
        data: CharacterReferencesResponse {
            id: request.character_id,
            reference_images,
        },
    }))
}

/// POST /generate/environment
pub async fn generate_environment(
    State(state): State<AppState>,
    Json(input): Json<GenerateEnvironmentRequest>,
) -> AppResult<Json<DataResponse<EnvironmentReferencesResponse>>> {
    let id = input.id.trim().to_string();
    let reference_images = state
        .references
        .generate_environment_references(&id, input.force)
        .await?;

    Ok(Json(DataResponse {
        data: EnvironmentReferencesResponse {
            id,
            reference_images,
        },
    }))
}

/// POST /generate/character-json
///
/// Turn a free-text description into a character sheet. Nothing is saved;
/// the editor writes the sheet through `/data` once the user accepts it.
pub async fn generate_character_json(
    State(state): State<AppState>,
    Json(input): Json<GenerateCharacterJsonRequest>,
) -> AppResult<Json<DataResponse<Value>>> {
    let sheet = generate_character_sheet(state.text.as_ref(), &input.prompt).await?;
    Ok(Json(DataResponse { data: sheet }))
}

/// POST /batch-render
///
/// Render one image per character sheet in the data root.
pub async fn batch_render(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BatchRenderResponse>>> {
    let rendered_assets = state.references.render_character_sheets().await?;
    Ok(Json(DataResponse {
        data: BatchRenderResponse { rendered_assets },
    }))
}
