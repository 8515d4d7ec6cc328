//! Reference image naming convention.
//!
//! Generates deterministic relative paths for reference images. Paths are
//! relative to the record's category directory (e.g. `characters/`) and
//! always use `/` separators, since they are stored in the sidecar JSON.

/// Extension of every generated reference image.
pub const REFERENCE_EXTENSION: &str = "jpg";

/// Generate a reference image filename.
///
/// Convention: `{angle}{_index}.jpg`, where `_index` is present only for
/// multi-variant angles.
///
/// # Examples
///
/// ```
/// use move37_core::naming::reference_filename;
///
/// assert_eq!(reference_filename("front", None), "front.jpg");
/// assert_eq!(reference_filename("front", Some(2)), "front_2.jpg");
/// ```
pub fn reference_filename(angle: &str, variant_index: Option<u32>) -> String {
    match variant_index {
        Some(index) => format!("{angle}_{index}.{REFERENCE_EXTENSION}"),
        None => format!("{angle}.{REFERENCE_EXTENSION}"),
    }
}

/// Variant indices for an angle: `[None]` for a single image, otherwise
/// `Some(1)..=Some(count)`.
pub fn variant_indices(variant_count: u32) -> Vec<Option<u32>> {
    if variant_count <= 1 {
        vec![None]
    } else {
        (1..=variant_count).map(Some).collect()
    }
}

/// Directory holding a character's references for one style:
/// `{character_id}_refs/{style}`.
pub fn character_reference_dir(character_id: &str, style: &str) -> String {
    format!("{character_id}_refs/{style}")
}

/// Directory holding an environment's references: `{environment_id}_refs`.
pub fn environment_reference_dir(environment_id: &str) -> String {
    format!("{environment_id}_refs")
}

/// Single image rendered from a whole character sheet:
/// `{character_id}_refs/sheet.jpg`, next to the per-style directories.
pub fn character_sheet_render_path(character_id: &str) -> String {
    format!("{character_id}_refs/sheet.{REFERENCE_EXTENSION}")
}
