//! Explicit exclusions (`Denied` phase).
//!
//! Every key listed in `denied.*` gets the permanent denial marker, which
//! no later phase may overwrite.

use crate::schema::DenyList;
use crate::source::{Cached, Source};
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::path::PathBuf;

const NAME: &str = "deny_list";

#[derive(Debug)]
pub struct DenyListPusher {
    list: Cached<DenyList>,
    buffer: Mappings,
}

impl DenyListPusher {
    pub fn new(list: Source<DenyList>) -> Self {
        Self {
            list: Cached::new(list),
            buffer: Mappings::new(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Source::File {
            dir: dir.into(),
            base_name: "denied",
        })
    }
}

impl EntryPusher for DenyListPusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Denied
    }

    fn initialize(&mut self, factory_reset: bool, regenerating: bool) {
        self.list.refresh(NAME, factory_reset || regenerating);
    }

    fn process(&mut self, _view: &Mappings) {
        self.buffer.clear();
        if let Some(list) = self.list.current() {
            for key in &list.denied {
                self.buffer.insert(key.as_str(), GooEntry::denied());
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
