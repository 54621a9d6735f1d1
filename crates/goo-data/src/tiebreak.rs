//! Last-resort assignments (`Final` phase).
//!
//! Runs once after convergence. Gives `final.*` values to keys that are
//! still unknown, and optionally a flat value to everything else left over.

use crate::schema::FinalTable;
use crate::source::{Cached, Source};
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::path::PathBuf;

const NAME: &str = "final_tiebreak";

#[derive(Debug)]
pub struct FinalPusher {
    table: Cached<FinalTable>,
    buffer: Mappings,
}

impl FinalPusher {
    pub fn new(table: Source<FinalTable>) -> Self {
        Self {
            table: Cached::new(table),
            buffer: Mappings::new(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Source::File {
            dir: dir.into(),
            base_name: "final",
        })
    }
}

impl EntryPusher for FinalPusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Final
    }

    fn initialize(&mut self, factory_reset: bool, regenerating: bool) {
        self.table.refresh(NAME, factory_reset || regenerating);
    }

    fn process(&mut self, view: &Mappings) {
        self.buffer.clear();
        let Some(table) = self.table.current() else {
            return;
        };
        for (key, entry) in view.iter() {
            if !entry.is_unknown() {
                continue;
            }
            if let Some(value) = table.values.get(key).copied().or(table.fill_remaining) {
                self.buffer.insert(key, GooEntry::known(value, EntryPhase::Final));
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
