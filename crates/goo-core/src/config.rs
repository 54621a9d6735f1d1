//! Resolver tuning knobs, loadable from a data file.

use serde::{Deserialize, Serialize};

/// Default cap on passes of either convergence loop.
pub const DEFAULT_MAX_PASSES: usize = 4096;

/// Default snapshot file name inside a world directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "goop-mappings-final.json";

/// Configuration for an [`EntryHandler`](crate::handler::EntryHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Hard cap on outer passes over the derivative phases.
    #[serde(default = "default_max_passes")]
    pub max_outer_passes: usize,
    /// Hard cap on inner passes within a single derivative phase.
    #[serde(default = "default_max_passes")]
    pub max_inner_passes: usize,
    /// Snapshot file name used by [`FileStore::for_world`](crate::snapshot::FileStore::for_world).
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_outer_passes: default_max_passes(),
            max_inner_passes: default_max_passes(),
            snapshot_file: default_snapshot_file(),
        }
    }
}
