//! The unit of knowledge the resolver manipulates.
//!
//! A [`GooEntry`] pairs a goo equivalency value with an unknown flag and the
//! phase that produced it. The key (`"namespace:item"`) lives in the map
//! that owns the entry.

use crate::phase::EntryPhase;
use serde::{Deserialize, Serialize};

/// Goo required per unit of an item, plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GooEntry {
    pub value: f64,
    pub unknown: bool,
    /// Phase category that wrote this entry. `None` for the sentinel and for
    /// entries whose provenance was never recorded.
    #[serde(default)]
    pub origin: Option<EntryPhase>,
}

impl GooEntry {
    /// Canonical sentinel returned for keys nobody has asserted.
    pub const UNKNOWN: GooEntry = GooEntry {
        value: 0.0,
        unknown: true,
        origin: None,
    };

    /// A known value written by `phase`.
    pub fn known(value: f64, phase: EntryPhase) -> Self {
        Self {
            value,
            unknown: false,
            origin: Some(phase),
        }
    }

    /// A placeholder registering `key` as needing a value.
    pub fn unknown(phase: EntryPhase) -> Self {
        Self {
            value: 0.0,
            unknown: true,
            origin: Some(phase),
        }
    }

    /// The permanent exclusion marker.
    pub fn denied() -> Self {
        Self::known(0.0, EntryPhase::Denied)
    }

    pub fn is_unknown(&self) -> bool {
        self.unknown
    }

    pub fn is_denied(&self) -> bool {
        self.origin == Some(EntryPhase::Denied)
    }

    /// Same stored content. Values compare bitwise so `-0.0` and `NaN`
    /// changes are still seen as changes.
    pub fn same_as(&self, other: &GooEntry) -> bool {
        self.unknown == other.unknown
            && self.origin == other.origin
            && self.value.to_bits() == other.value.to_bits()
    }
}

impl Default for GooEntry {
    fn default() -> Self {
        Self::UNKNOWN
    }
}
