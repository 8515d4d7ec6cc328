//! Style records and the style resolver.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::records::non_empty;
use crate::source::RecordSource;

/// Art style used when no style record can be resolved.
pub const DEFAULT_ART_STYLE: &str = "Cinematic";

fn default_art_style() -> String {
    DEFAULT_ART_STYLE.to_string()
}

/// Camera settings attached to a style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraLanguage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named bundle of art-direction parameters, stored in `styles/{id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    #[serde(default = "default_art_style")]
    pub art_style: String,
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub camera_language: CameraLanguage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for StyleRecord {
    fn default() -> Self {
        Self {
            art_style: default_art_style(),
            lighting: String::new(),
            camera_language: CameraLanguage::default(),
            extra: Map::new(),
        }
    }
}

impl StyleRecord {
    /// Art style, falling back to [`DEFAULT_ART_STYLE`] when blank.
    pub fn art_style(&self) -> &str {
        let trimmed = self.art_style.trim();
        if trimmed.is_empty() {
            DEFAULT_ART_STYLE
        } else {
            trimmed
        }
    }

    pub fn lighting(&self) -> Option<&str> {
        Some(self.lighting.trim()).filter(|s| !s.is_empty())
    }

    pub fn lens(&self) -> Option<&str> {
        non_empty(&self.camera_language.lens)
    }
}

/// Resolve a style by identifier.
///
/// An absent or blank identifier, or a style the source does not know,
/// yields [`StyleRecord::default`] and a warning. Never fails.
pub fn resolve_style(source: &impl RecordSource, style_id: Option<&str>) -> StyleRecord {
    let Some(style_id) = style_id.map(str::trim).filter(|s| !s.is_empty()) else {
        tracing::debug!("No style id given, using default style");
        return StyleRecord::default();
    };

    match source.style(style_id) {
        Some(style) => style,
        None => {
            tracing::warn!(style_id, "Style not found, using default style");
            StyleRecord::default()
        }
    }
}
