//! Per-world persistence of the resolved table.
//!
//! The resolver reads a snapshot at the start of a non-resetting reload and
//! writes one after every convergence pass. A missing or corrupt snapshot is
//! "no prior data", never an error.

use crate::config::ResolverConfig;
use crate::mapping::Mappings;
use std::path::{Path, PathBuf};

/// Errors that can occur while writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("snapshot write to {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a world's resolved table lives between reloads.
pub trait SnapshotStore: std::fmt::Debug {
    /// The last saved table, or `None` if there is nothing usable.
    fn load(&self) -> Option<Mappings>;

    /// Replace the stored table with `mappings`.
    fn save(&mut self, mappings: &Mappings) -> Result<(), PersistError>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A pretty-printed JSON object of `"namespace:id" -> {"value", "unknown"}`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured snapshot file inside `world_dir`.
    pub fn for_world(world_dir: &Path, config: &ResolverConfig) -> Self {
        Self::new(world_dir.join(&config.snapshot_file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Option<Mappings> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "snapshot", path = %self.path.display(), "no_snapshot");
                return None;
            }
            Err(err) => {
                tracing::warn!(
                    target: "snapshot",
                    path = %self.path.display(),
                    error = %err,
                    "snapshot_unreadable"
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(mappings) => Some(mappings),
            Err(err) => {
                tracing::warn!(
                    target: "snapshot",
                    path = %self.path.display(),
                    error = %err,
                    "snapshot_corrupt"
                );
                None
            }
        }
    }

    fn save(&mut self, mappings: &Mappings) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(mappings)?;
        let io_err = |source| PersistError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, json).map_err(io_err)?;
        tracing::debug!(
            target: "snapshot",
            path = %self.path.display(),
            entries = mappings.len(),
            "snapshot_written"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Keeps every saved table so writes can be inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    seed: Option<Mappings>,
    saves: Vec<Mappings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `mappings`, as if saved by an earlier run.
    pub fn with_snapshot(mappings: Mappings) -> Self {
        Self {
            seed: Some(mappings),
            saves: Vec::new(),
        }
    }

    /// Number of `save` calls.
    pub fn writes(&self) -> usize {
        self.saves.len()
    }

    /// The most recently saved table.
    pub fn last_saved(&self) -> Option<&Mappings> {
        self.saves.last()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Option<Mappings> {
        self.saves.last().or(self.seed.as_ref()).cloned()
    }

    fn save(&mut self, mappings: &Mappings) -> Result<(), PersistError> {
        self.saves.push(mappings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::GooEntry;
    use crate::phase::EntryPhase;
    use crate::test_utils::scratch_dir;

    fn sample() -> Mappings {
        let mut m = Mappings::new();
        m.insert("goo:b", GooEntry::known(0.1 + 0.2, EntryPhase::Derived));
        m.insert("goo:a", GooEntry::known(1.0 / 3.0, EntryPhase::Initialize));
        m.insert("goo:c", GooEntry::unknown(EntryPhase::Baseline));
        m
    }

    #[test]
    fn file_round_trip_is_exact() {
        let dir = scratch_dir("snapshot_round_trip");
        let mut store = FileStore::for_world(&dir, &ResolverConfig::default());
        store.save(&sample()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(
            loaded.get("goo:a").unwrap().value.to_bits(),
            (1.0f64 / 3.0).to_bits()
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_is_keyed_object_in_key_order() {
        let dir = scratch_dir("snapshot_shape");
        let mut store = FileStore::new(dir.join("nested").join("final.json"));
        store.save(&sample()).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let a = text.find("goo:a").unwrap();
        let b = text.find("goo:b").unwrap();
        let c = text.find("goo:c").unwrap();
        assert!(a < b && b < c);

        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["goo:c"]["unknown"], serde_json::Value::Bool(true));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = scratch_dir("snapshot_missing");
        let store = FileStore::new(dir.join("absent.json"));
        assert!(store.load().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_loads_none() {
        let dir = scratch_dir("snapshot_corrupt");
        let path = dir.join("final.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(FileStore::new(&path).load().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_store_tracks_writes() {
        let mut store = MemoryStore::with_snapshot(sample());
        assert_eq!(store.load(), Some(sample()));
        assert_eq!(store.writes(), 0);

        store.save(&Mappings::new()).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load(), Some(Mappings::new()));
    }
}
