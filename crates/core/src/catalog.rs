//! Asset and raw-record catalog over the data root.
//!
//! Raw JSON records are read and written verbatim (no schema applied) but
//! only inside the allow-listed categories, and writes must parse as JSON.

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::store::write_atomic;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Record categories exposed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Characters,
    Environments,
    Styles,
}

/// Valid category names.
pub const VALID_CATEGORIES: &[&str] = &["characters", "environments", "styles"];

impl Category {
    /// Parse an allow-listed category name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "characters" => Ok(Self::Characters),
            "environments" => Ok(Self::Environments),
            "styles" => Ok(Self::Styles),
            other => Err(CoreError::InvalidArgument(format!(
                "Invalid category '{other}'. Must be one of: {VALID_CATEGORIES:?}"
            ))),
        }
    }

    /// Directory name under the data root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Characters => "characters",
            Self::Environments => "environments",
            Self::Styles => "styles",
        }
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Media kind, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    /// Classify by extension (case-insensitive). `None` for non-media files.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "png" => Some(Self::Image),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }
}

/// One media file under the data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    /// Path relative to the data root, `/`-separated.
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Data root joined with `path`, `/`-separated.
    pub full_path: String,
}

/// Recursively list image and video files under `data_root`, sorted by path.
///
/// A missing data root yields an empty list.
pub fn list_assets(data_root: &Path) -> Vec<AssetEntry> {
    let mut assets: Vec<AssetEntry> = WalkDir::new(data_root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable catalog entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let kind = AssetKind::from_extension(entry.path().extension()?.to_str()?)?;
            let relative = entry.path().strip_prefix(data_root).ok()?;
            Some(AssetEntry {
                path: normalize_separators(&relative.to_string_lossy()),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                full_path: normalize_separators(&entry.path().to_string_lossy()),
            })
        })
        .collect();

    assets.sort_by(|a, b| a.path.cmp(&b.path));
    assets
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// List the `.json` files of a category, sorted. A missing directory
/// yields an empty list.
pub fn list_records(data_root: &Path, category: &str) -> Result<Vec<String>, CoreError> {
    let category = Category::from_name(category)?;
    let dir = data_root.join(category.dir_name());

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Read a raw record as text.
pub fn read_record(data_root: &Path, category: &str, filename: &str) -> Result<String, CoreError> {
    let category = Category::from_name(category)?;
    validate_filename(filename)?;

    let path = data_root.join(category.dir_name()).join(filename);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CoreError::not_found("Record", format!("{}/{filename}", category.dir_name())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write a raw record after checking that `content` parses as JSON.
///
/// Invalid JSON fails with InvalidArgument and leaves any existing file
/// untouched.
pub fn write_record(
    data_root: &Path,
    category: &str,
    filename: &str,
    content: &str,
) -> Result<(), CoreError> {
    let category = Category::from_name(category)?;
    validate_filename(filename)?;

    if let Err(e) = serde_json::from_str::<serde_json::Value>(content) {
        return Err(CoreError::InvalidArgument(format!("Content is not valid JSON: {e}")));
    }

    let path = data_root.join(category.dir_name()).join(filename);
    write_atomic(&path, content.as_bytes())?;
    tracing::info!(category = category.dir_name(), filename, "Record written");
    Ok(())
}

/// Reject filenames that are empty or would leave the category directory.
fn validate_filename(filename: &str) -> Result<(), CoreError> {
    if filename.trim().is_empty()
        || filename.contains(&['/', '\\'][..])
        || filename.contains("..")
    {
        return Err(CoreError::InvalidArgument(format!(
            "Invalid filename '{filename}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn touch(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn category_allow_list() {
        assert_eq!(Category::from_name("styles").unwrap(), Category::Styles);
        assert_matches!(Category::from_name("secrets"), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn assets_are_listed_recursively_and_classified() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "characters/kaelen_refs/noir/front.jpg", "");
        touch(dir.path(), "environments/alley_refs/establishing.PNG", "");
        touch(dir.path(), "renders/teaser.mp4", "");
        touch(dir.path(), "characters/kaelen.json", "{}");
        touch(dir.path(), "notes.txt", "");

        let assets = list_assets(dir.path());
        let paths: Vec<_> = assets.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "characters/kaelen_refs/noir/front.jpg",
                "environments/alley_refs/establishing.PNG",
                "renders/teaser.mp4",
            ]
        );
        assert_eq!(assets[0].name, "front.jpg");
        assert_eq!(assets[0].kind, AssetKind::Image);
        assert_eq!(assets[2].kind, AssetKind::Video);
        assert!(assets[0].full_path.ends_with("/characters/kaelen_refs/noir/front.jpg"));
    }

    #[test]
    fn asset_serializes_type_field() {
        let entry = AssetEntry {
            path: "a.mp4".into(),
            name: "a.mp4".into(),
            kind: AssetKind::Video,
            full_path: "data/a.mp4".into(),
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["type"], "video");
    }

    #[test]
    fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_assets(&dir.path().join("absent")).is_empty());
        assert!(list_records(&dir.path().join("absent"), "characters")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn list_records_filters_json() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "characters/b.json", "{}");
        touch(dir.path(), "characters/a.json", "{}");
        touch(dir.path(), "characters/a_refs/default_style/front.jpg", "");

        assert_eq!(list_records(dir.path(), "characters").unwrap(), ["a.json", "b.json"]);
    }

    #[test]
    fn write_then_read_record() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "styles", "noir.json", r#"{"art_style": "Noir"}"#).unwrap();
        assert_eq!(
            read_record(dir.path(), "styles", "noir.json").unwrap(),
            r#"{"art_style": "Noir"}"#
        );
    }

    #[test]
    fn invalid_json_write_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "characters/kaelen.json", r#"{"name": "Kaelen"}"#);

        let result = write_record(dir.path(), "characters", "kaelen.json", "not json");

        assert_matches!(result, Err(CoreError::InvalidArgument(_)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("characters/kaelen.json")).unwrap(),
            r#"{"name": "Kaelen"}"#
        );
    }

    #[test]
    fn disallowed_category_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            write_record(dir.path(), "secrets", "x.json", "{}"),
            Err(CoreError::InvalidArgument(_))
        );
        assert_matches!(
            read_record(dir.path(), "characters", "../secrets.json"),
            Err(CoreError::InvalidArgument(_))
        );
        assert_matches!(
            read_record(dir.path(), "characters", "absent.json"),
            Err(CoreError::NotFound { .. })
        );
    }
}
