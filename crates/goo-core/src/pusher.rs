//! The pluggable rule-contributor contract.
//!
//! Pushers hook into the resolver's phased pipeline via the [`EntryPusher`]
//! trait. Each reload calls `initialize`, `process`, then `push_to` on every
//! pusher of the phase being run. Only `push_to` touches the authoritative
//! table, and it does so through the phase merge policy of
//! [`Mappings::offer`].

use crate::mapping::Mappings;
use crate::phase::{EntryPhase, ProgressState};
use std::any::{Any, TypeId};

/// A pluggable source of goo equivalency entries.
///
/// Termination of the convergence loop relies on pushers being monotonic:
/// once a key is known it is never offered back as unknown, and derivative
/// values only move toward a fixed point.
pub trait EntryPusher: std::fmt::Debug + Any {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// The phase this pusher runs in. Must not change after construction.
    fn phase(&self) -> EntryPhase;

    /// (Re)load the external data source. Repeated calls without a reset
    /// must leave the pusher in the same state. A factory reset discards
    /// anything cached or resolved.
    fn initialize(&mut self, factory_reset: bool, regenerating: bool);

    /// Recompute the candidate buffer. `view` is the current authoritative
    /// table, read-only.
    fn process(&mut self, view: &Mappings);

    /// The buffer computed by the last `process`.
    fn candidates(&self) -> &Mappings;

    /// Merge the candidate buffer into `mappings`.
    fn push_to(&mut self, mappings: &mut Mappings) -> ProgressState {
        mappings.offer_all(self.phase(), self.candidates())
    }

    /// Whether this pusher's contribution is stable. Only consulted by the
    /// convergence loop.
    fn is_resolved(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Registered pushers in registration order, keyed by concrete type.
#[derive(Debug, Default)]
pub struct PusherSet {
    slots: Vec<(TypeId, Box<dyn EntryPusher>)>,
}

impl PusherSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `pusher`. A pusher of the same concrete type is replaced in its
    /// original slot, so same-phase order stays stable.
    pub fn register<P: EntryPusher>(&mut self, pusher: P) {
        let id = TypeId::of::<P>();
        let boxed: Box<dyn EntryPusher> = Box::new(pusher);
        match self.slots.iter_mut().find(|(slot_id, _)| *slot_id == id) {
            Some(slot) => slot.1 = boxed,
            None => self.slots.push((id, boxed)),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get<P: EntryPusher>(&self) -> Option<&P> {
        self.slots
            .iter()
            .find(|(id, _)| *id == TypeId::of::<P>())
            .and_then(|(_, p)| p.as_any().downcast_ref::<P>())
    }

    pub fn get_mut<P: EntryPusher>(&mut self) -> Option<&mut P> {
        self.slots
            .iter_mut()
            .find(|(id, _)| *id == TypeId::of::<P>())
            .and_then(|(_, p)| p.as_any_mut().downcast_mut::<P>())
    }

    /// Slot indices of every pusher in `phase`, registration order.
    pub(crate) fn indices_in(&self, phase: EntryPhase) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.phase() == phase)
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut dyn EntryPusher {
        self.slots[index].1.as_mut()
    }

    pub(crate) fn at(&self, index: usize) -> &dyn EntryPusher {
        self.slots[index].1.as_ref()
    }
}
