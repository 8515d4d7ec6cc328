//! Read-only lookup of related records during prompt composition.

use crate::records::{CharacterRecord, EnvironmentRecord};
use crate::style::StyleRecord;

/// Lookups the composer and resolvers need.
///
/// Every method answers `None` for anything missing or unreadable; callers
/// substitute defaults rather than fail.
pub trait RecordSource {
    fn character(&self, id: &str) -> Option<CharacterRecord>;

    fn environment(&self, id: &str) -> Option<EnvironmentRecord>;

    fn style(&self, id: &str) -> Option<StyleRecord>;

    /// Human-readable phrase for a shot type, e.g. `medium_shot`.
    fn shot_phrase(&self, shot_type: &str) -> Option<String>;
}

#[cfg(test)]
pub use memory::MemorySource;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;

    use serde_json::Value;

    use super::*;

    /// In-memory [`RecordSource`] for unit tests.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        characters: HashMap<String, CharacterRecord>,
        environments: HashMap<String, EnvironmentRecord>,
        styles: HashMap<String, StyleRecord>,
        shots: HashMap<String, String>,
    }

    impl MemorySource {
        pub fn insert_character(&mut self, id: &str, value: Value) {
            let record = serde_json::from_value(value).expect("valid character");
            self.characters.insert(id.to_string(), record);
        }

        pub fn insert_environment(&mut self, id: &str, value: Value) {
            let record = serde_json::from_value(value).expect("valid environment");
            self.environments.insert(id.to_string(), record);
        }

        pub fn insert_style(&mut self, id: &str, value: Value) {
            let record = serde_json::from_value(value).expect("valid style");
            self.styles.insert(id.to_string(), record);
        }

        pub fn insert_shot(&mut self, shot_type: &str, phrase: &str) {
            self.shots.insert(shot_type.to_string(), phrase.to_string());
        }
    }

    impl RecordSource for MemorySource {
        fn character(&self, id: &str) -> Option<CharacterRecord> {
            self.characters.get(id).cloned()
        }

        fn environment(&self, id: &str) -> Option<EnvironmentRecord> {
            self.environments.get(id).cloned()
        }

        fn style(&self, id: &str) -> Option<StyleRecord> {
            self.styles.get(id).cloned()
        }

        fn shot_phrase(&self, shot_type: &str) -> Option<String> {
            self.shots.get(shot_type).cloned()
        }
    }
}
