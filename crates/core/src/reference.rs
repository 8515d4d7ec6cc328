//! Reference angles and their prompt templates.
//!
//! Characters get four fixed angles, environments three. Each template is
//! textually distinct so the image model produces a consistent turnaround.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::records::{format_subject, non_empty, CharacterRecord, EnvironmentRecord};
use crate::style::StyleRecord;

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

pub const ANGLE_FRONT: &str = "front";
pub const ANGLE_SIDE: &str = "side";
pub const ANGLE_BACK: &str = "back";
pub const ANGLE_HEAD: &str = "head";

/// Character reference angles, in generation order.
pub const CHARACTER_ANGLES: &[&str] = &[ANGLE_FRONT, ANGLE_SIDE, ANGLE_BACK, ANGLE_HEAD];

pub const ANGLE_ESTABLISHING: &str = "establishing";
pub const ANGLE_REVERSE: &str = "reverse";
pub const ANGLE_DETAIL: &str = "detail";

/// Environment reference angles, in generation order.
pub const ENVIRONMENT_ANGLES: &[&str] = &[ANGLE_ESTABLISHING, ANGLE_REVERSE, ANGLE_DETAIL];

/// Output aspect ratio requested from the image capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
        }
    }
}

/// Aspect ratio for an environment angle: establishing shots are widescreen.
pub fn environment_aspect_ratio(angle: &str) -> AspectRatio {
    if angle == ANGLE_ESTABLISHING {
        AspectRatio::Widescreen
    } else {
        AspectRatio::Square
    }
}

// ---------------------------------------------------------------------------
// Character prompts
// ---------------------------------------------------------------------------

/// Build the prompt for every character angle, in [`CHARACTER_ANGLES`] order.
///
/// `fallback_name` is used when the record has no name (normally the
/// character id).
pub fn character_reference_prompts(
    character: &CharacterRecord,
    fallback_name: &str,
    style: &StyleRecord,
) -> IndexMap<String, String> {
    let name = character.display_name().unwrap_or(fallback_name);
    let mut traits = character.identity_traits();
    traits.extend(character.build_traits());
    let subject = format_subject(name, &traits);
    let art_style = style.art_style();

    CHARACTER_ANGLES
        .iter()
        .map(|&angle| {
            let framing = match angle {
                ANGLE_FRONT => format!(
                    "Full body front view of {subject}, standing in a neutral hero pose \
                     facing the camera, arms relaxed at the sides"
                ),
                ANGLE_SIDE => format!(
                    "Full body three-quarter profile side view of {subject}, \
                     turned 90 degrees to the left"
                ),
                ANGLE_BACK => format!(
                    "Full body back view of {subject}, seen directly from behind, \
                     showing hair and outfit from the rear"
                ),
                _ => format!(
                    "Close-up head and shoulders portrait of {subject}, \
                     neutral expression, looking straight into the camera"
                ),
            };
            let prompt = format!(
                "Character reference sheet. {framing}. Plain neutral grey studio background, \
                 even soft lighting, consistent character design. {art_style} style."
            );
            (angle.to_string(), prompt)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Environment prompts
// ---------------------------------------------------------------------------

/// Build the prompt for every environment angle, in [`ENVIRONMENT_ANGLES`] order.
pub fn environment_reference_prompts(
    environment: &EnvironmentRecord,
    fallback_name: &str,
    style: &StyleRecord,
) -> IndexMap<String, String> {
    let location = environment.location().unwrap_or(fallback_name);

    let mut atmosphere = Vec::new();
    if let Some(time_of_day) = non_empty(&environment.time_of_day) {
        atmosphere.push(format!("at {time_of_day}"));
    }
    if let Some(weather) = non_empty(&environment.weather) {
        atmosphere.push(format!("{weather} weather"));
    }
    if let Some(lighting) = non_empty(&environment.lighting) {
        atmosphere.push(format!("{lighting} lighting"));
    }
    if let Some(mood) = non_empty(&environment.mood) {
        atmosphere.push(format!("{mood} mood"));
    }
    let atmosphere = if atmosphere.is_empty() {
        String::new()
    } else {
        format!(", {}", atmosphere.join(", "))
    };
    let art_style = style.art_style();

    ENVIRONMENT_ANGLES
        .iter()
        .map(|&angle| {
            let framing = match angle {
                ANGLE_ESTABLISHING => format!("Wide establishing shot of {location}"),
                ANGLE_REVERSE => format!("Reverse angle view of {location}, looking back toward the entrance"),
                _ => format!("Detail shot of the textures and props of {location}"),
            };
            let prompt = format!(
                "Environment reference, no people. {framing}{atmosphere}. {art_style} style."
            );
            (angle.to_string(), prompt)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kaelen() -> CharacterRecord {
        serde_json::from_value(json!({
            "name": "Kaelen",
            "physical_traits": {"hair": "silver", "eyes": "neon blue", "physique": "wiry"},
            "clothing": "trench coat"
        }))
        .unwrap()
    }

    #[test]
    fn four_distinct_character_prompts_in_order() {
        let prompts = character_reference_prompts(&kaelen(), "kaelen", &StyleRecord::default());

        let angles: Vec<_> = prompts.keys().map(String::as_str).collect();
        assert_eq!(angles, CHARACTER_ANGLES);

        let mut unique: Vec<_> = prompts.values().collect();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);

        for prompt in prompts.values() {
            assert!(prompt.contains("Kaelen (silver, neon blue, trench coat, wiry)"), "{prompt}");
            assert!(prompt.contains("Cinematic style"), "{prompt}");
        }
        assert!(prompts["front"].contains("front view"));
        assert!(prompts["side"].contains("profile"));
        assert!(prompts["back"].contains("from behind"));
        assert!(prompts["head"].contains("head and shoulders"));
    }

    #[test]
    fn character_prompt_uses_fallback_name() {
        let prompts = character_reference_prompts(
            &CharacterRecord::default(),
            "c_003",
            &StyleRecord::default(),
        );
        assert!(prompts["front"].contains("front view of c_003,"));
    }

    #[test]
    fn environment_prompts_embed_atmosphere() {
        let environment: EnvironmentRecord = serde_json::from_value(json!({
            "location_name": "Neon Alleyway",
            "time_of_day": "midnight",
            "weather": "rainy",
            "lighting": "neon",
            "mood": "tense"
        }))
        .unwrap();

        let prompts = environment_reference_prompts(&environment, "neon", &StyleRecord::default());
        let angles: Vec<_> = prompts.keys().map(String::as_str).collect();
        assert_eq!(angles, ENVIRONMENT_ANGLES);
        assert_eq!(
            prompts["establishing"],
            "Environment reference, no people. Wide establishing shot of Neon Alleyway, \
             at midnight, rainy weather, neon lighting, tense mood. Cinematic style."
        );
    }

    #[test]
    fn establishing_is_widescreen() {
        assert_eq!(environment_aspect_ratio("establishing"), AspectRatio::Widescreen);
        assert_eq!(environment_aspect_ratio("detail"), AspectRatio::Square);
        assert_eq!(AspectRatio::Widescreen.as_str(), "16:9");
    }
}
