//! On-disk data store.
//!
//! Layout under the data root:
//!
//! ```text
//! characters/{id}.json                         character sidecar
//! characters/{id}_refs/{style}/{angle}.jpg     character references
//! environments/{id}.json                       environment sidecar
//! environments/{id}_refs/{angle}.jpg           environment references
//! styles/{style_id}.json                       style records
//! cinematography/default.json                  shot-type phrases
//! ```
//!
//! Sidecars are rewritten whole through a temporary file and a rename, so a
//! reader never sees a half-written record.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Category;
use crate::cinematography::phrase_from_entry;
use crate::error::CoreError;
use crate::records::{CharacterRecord, EnvironmentRecord};
use crate::source::RecordSource;
use crate::style::StyleRecord;

/// Shot-type lookup, relative to the data root.
pub const CINEMATOGRAPHY_FILE: &str = "cinematography/default.json";

/// Filesystem-backed access to records and reference images.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Absolute path of a `/`-separated path relative to a category directory.
    pub fn resolve(&self, category: Category, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.category_dir(category), |path, part| path.join(part))
    }

    pub fn exists(&self, category: Category, relative: &str) -> bool {
        self.resolve(category, relative).is_file()
    }

    fn record_path(&self, category: Category, id: &str) -> PathBuf {
        self.category_dir(category).join(format!("{id}.json"))
    }

    // ---- characters ----

    /// Load a character sidecar. Fails with NotFound when the file is absent.
    pub fn load_character(&self, id: &str) -> Result<CharacterRecord, CoreError> {
        validate_record_id(id)?;
        load_json(&self.record_path(Category::Characters, id), "Character", id)
    }

    pub fn save_character(&self, id: &str, record: &CharacterRecord) -> Result<(), CoreError> {
        validate_record_id(id)?;
        save_json(&self.record_path(Category::Characters, id), record)
    }

    // ---- environments ----

    /// Load an environment sidecar. Fails with NotFound when the file is absent.
    pub fn load_environment(&self, id: &str) -> Result<EnvironmentRecord, CoreError> {
        validate_record_id(id)?;
        load_json(&self.record_path(Category::Environments, id), "Environment", id)
    }

    pub fn save_environment(&self, id: &str, record: &EnvironmentRecord) -> Result<(), CoreError> {
        validate_record_id(id)?;
        save_json(&self.record_path(Category::Environments, id), record)
    }

    // ---- images ----

    /// Write an image under a category directory, creating parent
    /// directories as needed. Returns the absolute path written.
    pub fn write_image(
        &self,
        category: Category,
        relative: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, CoreError> {
        let path = self.resolve(category, relative);
        write_atomic(&path, bytes)?;
        Ok(path)
    }

    // ---- optional lookups ----

    fn read_optional<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read record");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed record");
                None
            }
        }
    }
}

impl RecordSource for DataStore {
    fn character(&self, id: &str) -> Option<CharacterRecord> {
        validate_record_id(id).ok()?;
        self.read_optional(&self.record_path(Category::Characters, id))
    }

    fn environment(&self, id: &str) -> Option<EnvironmentRecord> {
        validate_record_id(id).ok()?;
        self.read_optional(&self.record_path(Category::Environments, id))
    }

    fn style(&self, id: &str) -> Option<StyleRecord> {
        validate_record_id(id).ok()?;
        self.read_optional(&self.record_path(Category::Styles, id))
    }

    fn shot_phrase(&self, shot_type: &str) -> Option<String> {
        let lookup: Value = self.read_optional(&self.root.join(CINEMATOGRAPHY_FILE))?;
        lookup.get(shot_type).and_then(phrase_from_entry)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject identifiers that would escape their category directory.
pub fn validate_record_id(id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::InvalidArgument("Record id must not be empty".into()));
    }
    if id.contains(&['/', '\\'][..]) || id.contains("..") {
        return Err(CoreError::InvalidArgument(format!(
            "Record id '{id}' must not contain path separators or '..'"
        )));
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(
    path: &Path,
    entity: &'static str,
    id: &str,
) -> Result<T, CoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::not_found(entity, id));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&text)?)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}
