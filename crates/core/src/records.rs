//! Record types stored in the JSON sidecar files.
//!
//! Every record keeps the fields it does not model in an `extra` map so a
//! read-modify-write cycle never drops data written by other tools.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Return the trimmed value of an optional string, or `None` if it is
/// absent or blank.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Physical description of a character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTraits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A character sheet as stored in `characters/{id}.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identifier emitted by the text-generation schema; `id` wins when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_traits: Option<PhysicalTraits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Either the legacy flat `angle -> path` map or the style-keyed map.
    /// See [`crate::migration`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_images: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_images_version: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CharacterRecord {
    /// The explicit identifier carried by the record, if any.
    pub fn explicit_id(&self) -> Option<&str> {
        non_empty(&self.id).or_else(|| non_empty(&self.character_id))
    }

    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    /// Non-empty identity traits in prompt order: hair, eyes, clothing.
    pub fn identity_traits(&self) -> Vec<&str> {
        let traits = self.physical_traits.as_ref();
        [
            traits.and_then(|t| non_empty(&t.hair)),
            traits.and_then(|t| non_empty(&t.eyes)),
            non_empty(&self.clothing),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Non-empty build descriptors: physique, then age range.
    pub fn build_traits(&self) -> Vec<&str> {
        let traits = self.physical_traits.as_ref();
        [
            traits.and_then(|t| non_empty(&t.physique)),
            traits.and_then(|t| non_empty(&t.age_range)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Render the prompt subject: `Name (hair, eyes, clothing)`.
    ///
    /// The parenthesised part is omitted when no trait is set. A record
    /// without a name is rendered as `fallback_name`.
    pub fn subject(&self, fallback_name: &str) -> String {
        let name = self.display_name().unwrap_or(fallback_name);
        format_subject(name, &self.identity_traits())
    }
}

/// Join a display name with its comma-separated traits.
pub fn format_subject(name: &str, traits: &[&str]) -> String {
    if traits.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({})", traits.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Environments
// ---------------------------------------------------------------------------

/// An environment sheet as stored in `environments/{id}.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Flat `angle -> path` map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_images: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvironmentRecord {
    pub fn location(&self) -> Option<&str> {
        non_empty(&self.location_name)
    }
}

// ---------------------------------------------------------------------------
// Scenes and sequences
// ---------------------------------------------------------------------------

/// One shot of a sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// Shot-type identifier, e.g. `medium_shot`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cinematography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An ordered list of scenes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub scenes: Vec<SceneRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subject_with_traits() {
        let record: CharacterRecord = serde_json::from_value(json!({
            "name": "Kaelen",
            "physical_traits": {"hair": "silver", "eyes": "neon blue"},
            "clothing": "trench coat"
        }))
        .unwrap();
        assert_eq!(record.subject("kaelen"), "Kaelen (silver, neon blue, trench coat)");
    }

    #[test]
    fn subject_skips_blank_traits() {
        let record: CharacterRecord = serde_json::from_value(json!({
            "name": "Mira",
            "physical_traits": {"hair": "  ", "eyes": "amber"},
            "clothing": ""
        }))
        .unwrap();
        assert_eq!(record.subject("mira"), "Mira (amber)");
    }

    #[test]
    fn subject_without_name_or_traits_uses_fallback() {
        let record = CharacterRecord::default();
        assert_eq!(record.subject("c_003"), "c_003");
    }

    #[test]
    fn explicit_id_prefers_id_over_character_id() {
        let record: CharacterRecord =
            serde_json::from_value(json!({"id": "kaelen", "character_id": "c_001"})).unwrap();
        assert_eq!(record.explicit_id(), Some("kaelen"));

        let record: CharacterRecord =
            serde_json::from_value(json!({"id": "", "character_id": "c_001"})).unwrap();
        assert_eq!(record.explicit_id(), Some("c_001"));
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let input = json!({
            "name": "Kaelen",
            "tattoos": ["left arm"],
            "physical_traits": {"hair": "silver", "height": "tall"}
        });
        let record: CharacterRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }
}
