//! Raw value loader (`Initialize` phase).
//!
//! Reads `values.{ron,json,toml}` from the config directory. A missing file
//! is created from the built-in defaults; a factory reset overwrites it with
//! them.

use crate::loader::{DataLoadError, Format, deserialize_file, find_data_file, write_file};
use crate::schema::ValueTable;
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::path::{Path, PathBuf};

const NAME: &str = "raw_values";
const BASE_NAME: &str = "values";

#[derive(Debug)]
pub struct RawValuePusher {
    dir: PathBuf,
    defaults: ValueTable,
    /// Format used when the file has to be created.
    format: Format,
    current: Option<ValueTable>,
    buffer: Mappings,
}

impl RawValuePusher {
    pub fn new(dir: impl Into<PathBuf>, defaults: ValueTable) -> Self {
        Self {
            dir: dir.into(),
            defaults,
            format: Format::Json,
            current: None,
            buffer: Mappings::new(),
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, factory_reset: bool) -> Result<ValueTable, DataLoadError> {
        match find_data_file(&self.dir, BASE_NAME)? {
            Some(path) if !factory_reset => deserialize_file(&path),
            existing => {
                let path = existing.unwrap_or_else(|| {
                    self.dir
                        .join(format!("{BASE_NAME}.{}", self.format.extension()))
                });
                write_file(&path, &self.defaults)?;
                tracing::info!(
                    target: "pusher",
                    pusher = NAME,
                    path = %path.display(),
                    entries = self.defaults.values.len(),
                    "default_values_written"
                );
                Ok(self.defaults.clone())
            }
        }
    }
}

impl EntryPusher for RawValuePusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Initialize
    }

    fn initialize(&mut self, factory_reset: bool, regenerating: bool) {
        if self.current.is_some() && !factory_reset && !regenerating {
            return;
        }
        self.current = match self.load(factory_reset) {
            Ok(table) => Some(table),
            Err(err) => {
                tracing::warn!(target: "pusher", pusher = NAME, error = %err, "rule_source_failed");
                None
            }
        };
    }

    fn process(&mut self, _view: &Mappings) {
        self.buffer.clear();
        let Some(table) = &self.current else {
            return;
        };
        for (key, &value) in &table.values {
            self.buffer
                .insert(key.as_str(), GooEntry::known(value, EntryPhase::Initialize));
        }
    }

    fn candidates(&self) -> &Mappings {
        &self.buffer
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goo_core::test_utils::scratch_dir;
    use std::fs;

    fn defaults() -> ValueTable {
        ValueTable::from_pairs([("minecraft:cobblestone", 1.0), ("minecraft:dirt", 0.5)])
    }

    fn run(pusher: &mut RawValuePusher, factory_reset: bool) -> Mappings {
        pusher.initialize(factory_reset, false);
        pusher.process(&Mappings::new());
        pusher.candidates().clone()
    }

    #[test]
    fn missing_file_is_created_from_defaults() {
        let dir = scratch_dir("raw_create");
        let mut pusher = RawValuePusher::new(&dir, defaults());

        let out = run(&mut pusher, false);
        assert_eq!(out.known_value("minecraft:dirt"), Some(0.5));
        assert!(dir.join("values.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_created_in_chosen_format() {
        let dir = scratch_dir("raw_format");
        let mut pusher = RawValuePusher::new(&dir, defaults()).with_format(Format::Toml);
        assert_eq!(pusher.dir(), dir.as_path());

        run(&mut pusher, false);
        let path = dir.join("values.toml");
        assert!(path.exists());
        assert!(!dir.join("values.json").exists());
        let on_disk: ValueTable = deserialize_file(&path).unwrap();
        assert_eq!(on_disk, defaults());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn existing_file_wins_over_defaults() {
        let dir = scratch_dir("raw_existing");
        fs::write(
            dir.join("values.ron"),
            r#"(values: {"minecraft:cobblestone": 2.0})"#,
        )
        .unwrap();
        let mut pusher = RawValuePusher::new(&dir, defaults());

        let out = run(&mut pusher, false);
        assert_eq!(out.known_value("minecraft:cobblestone"), Some(2.0));
        assert!(!out.contains("minecraft:dirt"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn factory_reset_rewrites_file() {
        let dir = scratch_dir("raw_reset");
        let path = dir.join("values.toml");
        fs::write(&path, "[values]\n\"minecraft:cobblestone\" = 9.0\n").unwrap();
        let mut pusher = RawValuePusher::new(&dir, defaults());

        assert_eq!(run(&mut pusher, false).known_value("minecraft:cobblestone"), Some(9.0));
        assert_eq!(run(&mut pusher, true).known_value("minecraft:cobblestone"), Some(1.0));

        let on_disk: ValueTable = deserialize_file(&path).unwrap();
        assert_eq!(on_disk, defaults());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_contributes_nothing() {
        let dir = scratch_dir("raw_malformed");
        fs::write(dir.join("values.json"), "{{").unwrap();
        let mut pusher = RawValuePusher::new(&dir, defaults());
        assert!(run(&mut pusher, false).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
