//! `reference_images` layout migration for character records.
//!
//! Early records stored a flat `angle -> path` map. Current records key the
//! map by style: `style_id -> (angle -> path | [path])`. Records written by
//! this crate carry `reference_images_version: 2`, which short-circuits the
//! shape sniff below.
//!
//! The sniff is best-effort: a flat map is recognised by its angle-named
//! keys, so a style literally named `front` in an unversioned record is
//! indistinguishable from a legacy map and will be nested.

use serde_json::{Map, Value};

use crate::records::{non_empty, CharacterRecord};

/// Layout version written alongside the style-keyed map.
pub const REFERENCE_IMAGES_VERSION: u32 = 2;

/// Style key for legacy references whose style is unknown.
pub const LEGACY_STYLE_KEY: &str = "legacy";

/// Keys that identify the legacy flat layout.
pub const LEGACY_ANGLE_KEYS: &[&str] = &["front", "side", "back", "head", "full_body"];

/// Whether a map looks like the legacy flat `angle -> path` layout.
pub fn is_legacy_shape(images: &Map<String, Value>) -> bool {
    images
        .keys()
        .any(|key| LEGACY_ANGLE_KEYS.contains(&key.as_str()))
}

/// Bring `record.reference_images` into the style-keyed layout.
///
/// A missing or non-object value becomes an empty map. A legacy flat map is
/// nested under the record's `style_id`, or [`LEGACY_STYLE_KEY`] when it has
/// none. Already style-keyed maps are left untouched. Returns `true` when a
/// legacy map was nested.
pub fn migrate_reference_images(record: &mut CharacterRecord) -> bool {
    let mut images = match record.reference_images.take() {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let versioned = record
        .reference_images_version
        .is_some_and(|v| v >= REFERENCE_IMAGES_VERSION);
    let migrated = !versioned && is_legacy_shape(&images);

    if migrated {
        let style_key = non_empty(&record.style_id).unwrap_or(LEGACY_STYLE_KEY);
        tracing::info!(
            style_key,
            angles = images.len(),
            "Migrating legacy reference_images layout"
        );
        let mut nested = Map::new();
        nested.insert(style_key.to_string(), Value::Object(images));
        images = nested;
    }

    record.reference_images = Some(Value::Object(images));
    migrated
}

/// Migrate if needed, then record `references` under `style` and stamp the
/// layout version.
pub fn record_style_references(record: &mut CharacterRecord, style: &str, references: Value) {
    migrate_reference_images(record);
    if let Some(Value::Object(images)) = record.reference_images.as_mut() {
        images.insert(style.to_string(), references);
    }
    record.reference_images_version = Some(REFERENCE_IMAGES_VERSION);
}

/// Like [`record_style_references`], but keeps angles of the existing
/// `style` entry that `references` does not mention.
pub fn merge_style_references(
    record: &mut CharacterRecord,
    style: &str,
    references: Map<String, Value>,
) {
    migrate_reference_images(record);
    let mut merged = match record
        .reference_images
        .as_ref()
        .and_then(|images| images.get(style))
    {
        Some(Value::Object(existing)) => existing.clone(),
        _ => Map::new(),
    };
    merged.extend(references);
    record_style_references(record, style, Value::Object(merged));
}
