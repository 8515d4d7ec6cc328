//! Shot-type vocabulary.
//!
//! The lookup file `cinematography/default.json` maps shot-type identifiers
//! to phrases. Entries are either a plain string or an object with a
//! `description` string. Unknown shot types are humanized instead.

use serde_json::Value;

use crate::source::RecordSource;

/// Shot type used when a scene does not name one.
pub const DEFAULT_SHOT_TYPE: &str = "medium_shot";

/// Turn `extreme_close_up` into `Extreme close up`.
pub fn humanize_shot_type(shot_type: &str) -> String {
    let spaced = shot_type.trim().replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Extract the phrase from one lookup entry.
pub fn phrase_from_entry(entry: &Value) -> Option<String> {
    let phrase = match entry {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("description")?.as_str()?,
        _ => return None,
    };
    let phrase = phrase.trim();
    (!phrase.is_empty()).then(|| phrase.to_string())
}

/// Resolve the phrase for a shot type, humanizing unknown identifiers.
pub fn shot_phrase(source: &impl RecordSource, shot_type: &str) -> String {
    source
        .shot_phrase(shot_type)
        .unwrap_or_else(|| humanize_shot_type(shot_type))
}
