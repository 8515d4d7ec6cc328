//! Prompt composition.
//!
//! Turns a character sheet, environment sheet, single scene or scene
//! sequence into a natural-language prompt. Composition never fails on
//! missing optional data; every gap has a documented default.
//!
//! Scene formula: `"{cinematography}, {subject}, {action}, {context}. {ambiance}."`

use serde_json::Value;

use crate::cinematography::{shot_phrase, DEFAULT_SHOT_TYPE};
use crate::error::CoreError;
use crate::records::{non_empty, CharacterRecord, EnvironmentRecord, SceneRecord, Sequence};
use crate::source::RecordSource;
use crate::style::{resolve_style, StyleRecord};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Action used when a scene does not describe one.
pub const DEFAULT_ACTION: &str = "posing";

/// Subject used when a scene names no character at all.
pub const UNKNOWN_CHARACTER: &str = "Unknown Character";

/// Location used when a scene's environment cannot be resolved.
pub const UNSPECIFIED_LOCATION: &str = "unspecified location";

/// Character id synthesized for a sheet with neither id nor name.
pub const LEGACY_CHARACTER_ID: &str = "legacy";

/// Shot type used for environment sheets.
pub const ESTABLISHING_SHOT_TYPE: &str = "establishing_shot";

/// Separator between the prompts of a sequence.
pub const SCENE_SEPARATOR: &str = "\n\n";

/// Keys that mark a record as a single scene rather than a sheet.
const SCENE_KEYS: &[&str] = &["cinematography", "environment_id", "action"];

/// Keys that carry a character's own description.
const SHEET_KEYS: &[&str] = &["name", "physical_traits", "clothing", "extra_details"];

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

/// The record shapes the composer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptRecord {
    /// Has a `scenes` list.
    Sequence(Sequence),
    /// Has at least one scene key (`cinematography`, `environment_id`,
    /// `action`), or a `character_id` with no sheet fields (`name`,
    /// `physical_traits`, `clothing`, `extra_details`). The latter refers to
    /// a stored character instead of describing one.
    Scene(SceneRecord),
    /// Has a `location_name` and no character name.
    Environment(EnvironmentRecord),
    /// Anything else: a single character sheet.
    Sheet(CharacterRecord),
}

impl PromptRecord {
    /// Classify a raw JSON record by shape.
    pub fn classify(value: &Value) -> Result<Self, CoreError> {
        let obj = value.as_object().ok_or_else(|| {
            CoreError::InvalidArgument("Prompt record must be a JSON object".into())
        })?;

        let shape = if obj.contains_key("scenes") {
            Self::Sequence(serde_json::from_value(value.clone())?)
        } else if SCENE_KEYS.iter().any(|key| obj.contains_key(*key))
            || (obj.contains_key("character_id")
                && !SHEET_KEYS.iter().any(|key| obj.contains_key(*key)))
        {
            Self::Scene(serde_json::from_value(value.clone())?)
        } else if obj.contains_key("location_name") && !obj.contains_key("name") {
            Self::Environment(serde_json::from_value(value.clone())?)
        } else {
            Self::Sheet(serde_json::from_value(value.clone())?)
        };
        Ok(shape)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compose the prompt for any supported record shape.
///
/// Fails only when the record is not a JSON object or a known field has
/// the wrong JSON type.
pub fn compose(value: &Value, source: &impl RecordSource) -> Result<String, CoreError> {
    let prompt = match PromptRecord::classify(value)? {
        PromptRecord::Sequence(sequence) => compose_sequence(&sequence, source),
        PromptRecord::Scene(scene) => compose_scene(&scene, source),
        PromptRecord::Environment(environment) => compose_environment(&environment, source),
        PromptRecord::Sheet(sheet) => compose_sheet(&sheet, source),
    };
    Ok(prompt)
}

/// Compose every scene in order, separated by a blank line.
///
/// An empty sequence yields an empty string.
pub fn compose_sequence(sequence: &Sequence, source: &impl RecordSource) -> String {
    sequence
        .scenes
        .iter()
        .map(|scene| compose_scene(scene, source))
        .collect::<Vec<_>>()
        .join(SCENE_SEPARATOR)
}

/// Compose one scene, resolving its character through `source`.
pub fn compose_scene(scene: &SceneRecord, source: &impl RecordSource) -> String {
    let character = non_empty(&scene.character_id).and_then(|id| source.character(id));
    compose_scene_with(scene, character.as_ref(), source)
}

/// Compose a legacy single character sheet as an implicit medium shot.
///
/// The sheet itself is the scene's character.
pub fn compose_sheet(sheet: &CharacterRecord, source: &impl RecordSource) -> String {
    let character_id = sheet
        .explicit_id()
        .map(str::to_string)
        .or_else(|| sheet.display_name().map(str::to_lowercase))
        .unwrap_or_else(|| LEGACY_CHARACTER_ID.to_string());

    let scene = SceneRecord {
        character_id: Some(character_id),
        cinematography: Some(DEFAULT_SHOT_TYPE.to_string()),
        action: Some(DEFAULT_ACTION.to_string()),
        style_id: sheet.style_id.clone(),
        ..SceneRecord::default()
    };
    compose_scene_with(&scene, Some(sheet), source)
}

/// Compose a single environment sheet as an establishing shot.
pub fn compose_environment(environment: &EnvironmentRecord, source: &impl RecordSource) -> String {
    let shot = shot_phrase(source, ESTABLISHING_SHOT_TYPE);
    let style = resolve_style(source, non_empty(&environment.style_id));

    let mut details = Vec::new();
    if let Some(time_of_day) = non_empty(&environment.time_of_day) {
        details.push(time_of_day.to_string());
    }
    if let Some(mood) = non_empty(&environment.mood) {
        details.push(format!("{mood} mood"));
    }

    let mut prompt = shot;
    for detail in details {
        prompt.push_str(", ");
        prompt.push_str(&detail);
    }
    format!(
        "{prompt}, {}. {}.",
        context_phrase(Some(environment)),
        ambiance_phrase(&style)
    )
}

// ---------------------------------------------------------------------------
// Scene parts
// ---------------------------------------------------------------------------

/// Compose a scene with an already-resolved character.
pub fn compose_scene_with(
    scene: &SceneRecord,
    character: Option<&CharacterRecord>,
    source: &impl RecordSource,
) -> String {
    let shot_type = non_empty(&scene.cinematography).unwrap_or(DEFAULT_SHOT_TYPE);
    let cinematography = shot_phrase(source, shot_type);

    let character_id = non_empty(&scene.character_id);
    let subject = match character {
        Some(character) => character.subject(character_id.unwrap_or(UNKNOWN_CHARACTER)),
        None => {
            if let Some(id) = character_id {
                tracing::debug!(character_id = id, "Character not found, using raw id");
            }
            character_id.unwrap_or(UNKNOWN_CHARACTER).to_string()
        }
    };

    let action = non_empty(&scene.action).unwrap_or(DEFAULT_ACTION);

    let environment = non_empty(&scene.environment_id).and_then(|id| {
        let found = source.environment(id);
        if found.is_none() {
            tracing::debug!(environment_id = id, "Environment not found");
        }
        found
    });
    let context = context_phrase(environment.as_ref());

    let style = resolve_style(source, non_empty(&scene.style_id));
    let ambiance = ambiance_phrase(&style);

    format!("{cinematography}, {subject}, {action}, {context}. {ambiance}.")
}

/// `in {location}`, plus ` during {weather}` when weather is set.
pub fn context_phrase(environment: Option<&EnvironmentRecord>) -> String {
    let location = environment
        .and_then(EnvironmentRecord::location)
        .unwrap_or(UNSPECIFIED_LOCATION);

    match environment.and_then(|e| non_empty(&e.weather)) {
        Some(weather) => format!("in {location} during {weather}"),
        None => format!("in {location}"),
    }
}

/// `{art_style} style`, plus lighting and lens when the style sets them.
pub fn ambiance_phrase(style: &StyleRecord) -> String {
    let mut ambiance = format!("{} style", style.art_style());
    if let Some(lighting) = style.lighting() {
        ambiance.push_str(&format!(", {lighting} lighting"));
    }
    if let Some(lens) = style.lens() {
        ambiance.push_str(&format!(", shot on {lens}"));
    }
    ambiance
}
