//! The authoritative key -> entry table and its merge policy.
//!
//! [`Mappings`] is ordered by key (ascending lexicographic), which is the
//! order snapshots are written and sync packets are built in.

use crate::entry::GooEntry;
use crate::phase::{EntryPhase, ProgressState, SolvedState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Ordered mapping from item key to [`GooEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mappings {
    entries: BTreeMap<String, GooEntry>,
}

impl Mappings {
    /// An empty table usable in `static` position.
    pub const EMPTY: Mappings = Mappings {
        entries: BTreeMap::new(),
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&GooEntry> {
        self.entries.get(key)
    }

    /// The entry for `key`, or the unknown sentinel.
    pub fn get_or_unknown(&self, key: &str) -> GooEntry {
        self.entries.get(key).copied().unwrap_or(GooEntry::UNKNOWN)
    }

    /// The value of `key` if it is present and known.
    pub fn known_value(&self, key: &str) -> Option<f64> {
        self.entries
            .get(key)
            .filter(|e| !e.is_unknown())
            .map(|e| e.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GooEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Unconditional write. Used by pushers filling their own buffers, never
    /// on the authoritative table.
    pub fn insert(&mut self, key: impl Into<String>, entry: GooEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// `Solved` iff no entry is unknown. An empty table is solved.
    pub fn solved_state(&self) -> SolvedState {
        if self.entries.values().any(GooEntry::is_unknown) {
            SolvedState::Unsolved
        } else {
            SolvedState::Solved
        }
    }

    /// Keys still marked unknown, ascending.
    pub fn unknown_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_unknown())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Offer `candidate` for `key` on behalf of a pusher in `phase`.
    ///
    /// - an unknown candidate only registers a missing key
    /// - a denied key only accepts writes from the `Denied` phase
    /// - `Initialize` and `Denied` overwrite
    /// - `Baseline` and `Final` only fill missing or unknown keys
    /// - `Derived`/`Deferred` fill missing or unknown keys, or replace values
    ///   written by the derivative category
    ///
    /// Returns `Improved` iff the stored entry changed.
    pub fn offer(&mut self, phase: EntryPhase, key: &str, candidate: GooEntry) -> ProgressState {
        let slot = match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(candidate);
                return ProgressState::Improved;
            }
            Entry::Occupied(occupied) => occupied.into_mut(),
        };

        if candidate.is_unknown() {
            return ProgressState::Stagnant;
        }
        if slot.is_denied() && phase != EntryPhase::Denied {
            return ProgressState::Stagnant;
        }

        let writable = match phase {
            EntryPhase::Initialize | EntryPhase::Denied => true,
            EntryPhase::Baseline | EntryPhase::Final => slot.is_unknown(),
            EntryPhase::Derived | EntryPhase::Deferred => {
                slot.is_unknown() || slot.origin.is_some_and(EntryPhase::is_derivative)
            }
        };
        if !writable || slot.same_as(&candidate) {
            return ProgressState::Stagnant;
        }

        *slot = candidate;
        ProgressState::Improved
    }

    /// Offer every entry of `candidates` on behalf of `phase`.
    pub fn offer_all(&mut self, phase: EntryPhase, candidates: &Mappings) -> ProgressState {
        candidates
            .iter()
            .fold(ProgressState::Stagnant, |progress, (key, entry)| {
                progress.merge(self.offer(phase, key, *entry))
            })
    }

    /// Merge a previously persisted table. Entries only fill keys that are
    /// missing or unknown here; a known live value is never replaced.
    pub fn tracked_push(&mut self, persisted: Mappings) -> ProgressState {
        let mut progress = ProgressState::Stagnant;
        for (key, entry) in persisted.entries {
            match self.entries.entry(key) {
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                    progress = ProgressState::Improved;
                }
                Entry::Occupied(mut occupied) => {
                    let live = occupied.get_mut();
                    if live.is_unknown() && !entry.is_unknown() {
                        *live = entry;
                        progress = ProgressState::Improved;
                    }
                }
            }
        }
        progress
    }
}

impl FromIterator<(String, GooEntry)> for Mappings {
    fn from_iter<I: IntoIterator<Item = (String, GooEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Mappings {
    type Item = (String, GooEntry);
    type IntoIter = std::collections::btree_map::IntoIter<String, GooEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
