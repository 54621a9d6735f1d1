//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::entry::GooEntry;
use crate::mapping::Mappings;
use crate::phase::EntryPhase;
use crate::pusher::EntryPusher;
use std::any::Any;
use std::marker::PhantomData;
use std::path::PathBuf;

// ===========================================================================
// Closure pusher
// ===========================================================================

/// Marker types that give each [`FnPusher`] a distinct registration identity.
pub struct Tag1;
pub struct Tag2;
pub struct Tag3;
pub struct Tag4;
pub struct Tag5;

type Body = Box<dyn FnMut(&Mappings, &mut Mappings)>;

/// A pusher driven by a closure. The closure receives the current table and
/// an emptied output buffer on every `process`.
pub struct FnPusher<T> {
    phase: EntryPhase,
    body: Body,
    buffer: Mappings,
    resolved: bool,
    initializations: usize,
    runs: usize,
    _tag: PhantomData<T>,
}

impl<T: 'static> FnPusher<T> {
    pub fn new(phase: EntryPhase, body: impl FnMut(&Mappings, &mut Mappings) + 'static) -> Self {
        Self {
            phase,
            body: Box::new(body),
            buffer: Mappings::new(),
            resolved: false,
            initializations: 0,
            runs: 0,
            _tag: PhantomData,
        }
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn set_resolved(&mut self, resolved: bool) {
        self.resolved = resolved;
    }

    /// Number of `process` calls.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Number of `initialize` calls.
    pub fn initializations(&self) -> usize {
        self.initializations
    }
}

impl<T> std::fmt::Debug for FnPusher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPusher")
            .field("phase", &self.phase)
            .field("resolved", &self.resolved)
            .field("runs", &self.runs)
            .finish()
    }
}

impl<T: 'static> EntryPusher for FnPusher<T> {
    fn name(&self) -> &str {
        "fn"
    }

    fn phase(&self) -> EntryPhase {
        self.phase
    }

    fn initialize(&mut self, _factory_reset: bool, _regenerating: bool) {
        self.initializations += 1;
    }

    fn process(&mut self, view: &Mappings) {
        self.runs += 1;
        self.buffer.clear();
        (self.body)(view, &mut self.buffer);
    }

    fn candidates(&self) -> &Mappings {
        &self.buffer
    }

    fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A `Derived` pusher asserting `to = 2 * from` once `from` is known.
/// Until then it registers both keys as unknown.
pub fn doubling<T: 'static>(from: &'static str, to: &'static str) -> FnPusher<T> {
    FnPusher::new(EntryPhase::Derived, move |view, out| {
        match view.known_value(from) {
            Some(v) => out.insert(to, GooEntry::known(2.0 * v, EntryPhase::Derived)),
            None => {
                out.insert(from, GooEntry::unknown(EntryPhase::Derived));
                out.insert(to, GooEntry::unknown(EntryPhase::Derived));
            }
        }
    })
}

/// A `Baseline` pusher asserting a single known value.
pub fn baseline<T: 'static>(key: &'static str, value: f64) -> FnPusher<T> {
    FnPusher::new(EntryPhase::Baseline, move |_, out| {
        out.insert(key, GooEntry::known(value, EntryPhase::Baseline));
    })
}

// ===========================================================================
// Filesystem
// ===========================================================================

/// A fresh, empty directory under the system temp dir, unique per test name
/// and process.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("goo_test_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
