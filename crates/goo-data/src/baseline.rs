//! Baseline defaulter (`Baseline` phase).
//!
//! Registers the item universe: every registered key receives its fallback
//! value from `baseline.*`, or an unknown entry so the solver knows to look
//! for one.

use crate::schema::ValueTable;
use crate::source::{Cached, Source};
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::path::PathBuf;

const NAME: &str = "baseline";

#[derive(Debug)]
pub struct BaselinePusher {
    items: Vec<String>,
    fallbacks: Cached<ValueTable>,
    buffer: Mappings,
}

impl BaselinePusher {
    pub fn new(items: Vec<String>, fallbacks: Source<ValueTable>) -> Self {
        Self {
            items,
            fallbacks: Cached::new(fallbacks),
            buffer: Mappings::new(),
        }
    }

    /// Fallbacks read from `baseline.*` in `dir`.
    pub fn from_dir(items: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        Self::new(
            items,
            Source::File {
                dir: dir.into(),
                base_name: "baseline",
            },
        )
    }
}

impl EntryPusher for BaselinePusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Baseline
    }

    fn initialize(&mut self, factory_reset: bool, regenerating: bool) {
        self.fallbacks.refresh(NAME, factory_reset || regenerating);
    }

    fn process(&mut self, _view: &Mappings) {
        self.buffer.clear();
        let Some(table) = self.fallbacks.current() else {
            return;
        };
        for item in &self.items {
            let entry = match table.values.get(item) {
                Some(&value) => GooEntry::known(value, EntryPhase::Baseline),
                None => GooEntry::unknown(EntryPhase::Baseline),
            };
            self.buffer.insert(item.as_str(), entry);
        }
        for (key, &value) in &table.values {
            if !self.buffer.contains(key) {
                self.buffer
                    .insert(key.as_str(), GooEntry::known(value, EntryPhase::Baseline));
            }
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

    fn items() -> Vec<String> {
        vec!["minecraft:stick".to_string(), "minecraft:planks".to_string()]
    }

    #[test]
    fn registers_items_with_or_without_fallback() {
        let fallbacks = ValueTable::from_pairs([("minecraft:planks", 4.0), ("goo:extra", 1.0)]);
        let mut pusher = BaselinePusher::new(items(), Source::Inline(fallbacks));
        pusher.initialize(false, false);
        pusher.process(&Mappings::new());

        let out = pusher.candidates();
        assert!(out.get("minecraft:stick").unwrap().is_unknown());
        assert_eq!(out.known_value("minecraft:planks"), Some(4.0));
        assert_eq!(out.known_value("goo:extra"), Some(1.0));
    }

    #[test]
    fn does_not_replace_seeded_value() {
        let mut pusher = BaselinePusher::new(items(), Source::Inline(ValueTable::default()));
        let mut mappings = Mappings::new();
        mappings.offer(
            EntryPhase::Initialize,
            "minecraft:stick",
            GooEntry::known(2.0, EntryPhase::Initialize),
        );

        pusher.initialize(false, false);
        pusher.process(&mappings);
        pusher.push_to(&mut mappings);
        assert_eq!(mappings.known_value("minecraft:stick"), Some(2.0));
        assert!(mappings.get("minecraft:planks").unwrap().is_unknown());
    }
}
