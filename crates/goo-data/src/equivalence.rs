//! Equivalence rules (`Deferred` phase).
//!
//! `item` is worth `factor` times `source`. Runs after recipes within each
//! outer pass and only fills keys that are still unknown, so neither a
//! recipe value nor an earlier equivalence is ever rewritten.

use crate::loader::DataLoadError;
use crate::schema::{EquivalenceData, EquivalenceList};
use crate::source::{Cached, Source};
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

const NAME: &str = "equivalences";

#[derive(Debug)]
pub struct EquivalencePusher {
    rules: Cached<EquivalenceList>,
    valid: Vec<EquivalenceData>,
    buffer: Mappings,
}

impl EquivalencePusher {
    pub fn new(rules: Source<EquivalenceList>) -> Self {
        Self {
            rules: Cached::new(rules),
            valid: Vec::new(),
            buffer: Mappings::new(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Source::File {
            dir: dir.into(),
            base_name: "equivalences",
        })
    }

    pub fn rule_count(&self) -> usize {
        self.valid.len()
    }

    fn rebuild(&mut self) {
        self.valid.clear();
        let Some(list) = self.rules.current() else {
            return;
        };
        let file = self.rules.source().location();
        for rule in &list.equivalences {
            match check(rule) {
                Ok(()) => self.valid.push(rule.clone()),
                Err(reason) => {
                    let err = DataLoadError::Invalid {
                        file: file.clone(),
                        name: rule.item.clone(),
                        reason,
                    };
                    tracing::warn!(target: "pusher", pusher = NAME, error = %err, "rule_skipped");
                }
            }
        }
    }
}

fn check(rule: &EquivalenceData) -> Result<(), &'static str> {
    if !rule.factor.is_finite() || rule.factor < 0.0 {
        return Err("factor must be a finite, non-negative number");
    }
    if rule.item == rule.source {
        return Err("item is equivalent to itself");
    }
    Ok(())
}

/// Keys this phase may write: missing or unknown.
fn open(view: &Mappings, key: &str) -> bool {
    view.get(key).is_none_or(GooEntry::is_unknown)
}

impl EntryPusher for EquivalencePusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Deferred
    }

    fn initialize(&mut self, factory_reset: bool, regenerating: bool) {
        if self.rules.refresh(NAME, factory_reset || regenerating) {
            self.rebuild();
        } else if self.rules.current().is_none() {
            self.valid.clear();
        }
    }

    fn process(&mut self, view: &Mappings) {
        self.buffer.clear();
        let mut values: BTreeMap<&str, f64> = BTreeMap::new();
        let mut pending: BTreeSet<&str> = BTreeSet::new();

        for rule in &self.valid {
            if !open(view, &rule.item) {
                continue;
            }
            match view.get(&rule.source) {
                Some(source) if source.is_denied() => {}
                Some(source) if !source.is_unknown() => {
                    let value = rule.factor * source.value;
                    values
                        .entry(rule.item.as_str())
                        .and_modify(|best| *best = best.min(value))
                        .or_insert(value);
                }
                unknown_or_missing => {
                    pending.insert(rule.item.as_str());
                    if unknown_or_missing.is_none() {
                        pending.insert(rule.source.as_str());
                    }
                }
            }
        }

        for key in pending {
            self.buffer.insert(key, GooEntry::unknown(EntryPhase::Deferred));
        }
        for (key, value) in values {
            self.buffer.insert(key, GooEntry::known(value, EntryPhase::Deferred));
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
