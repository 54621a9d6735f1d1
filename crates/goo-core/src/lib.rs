//! Goo Core -- the goo equivalency value resolver.
//!
//! Assigns every registered item key a numeric "goo required per unit" by
//! propagating known values through pluggable rule sources until nothing
//! changes.
//!
//! # Phased pipeline
//!
//! Pushers are tagged with a [`phase::EntryPhase`]. Each call to
//! [`handler::EntryHandler::reload_mappings`] runs:
//!
//! 1. **Seed** -- `Initialize`, `Baseline`, `Denied`, once each.
//! 2. **Merge persisted** -- gaps filled from the world snapshot.
//! 3. **Converge** -- `Derived` and `Deferred` cycled to a fixed point
//!    (skipped when a merged snapshot leaves nothing unknown).
//! 4. **Finalize** -- `Final`, exactly once.
//! 5. **Persist** -- the world snapshot is rewritten.
//!
//! # Key Types
//!
//! - [`entry::GooEntry`] -- value, unknown flag, provenance.
//! - [`mapping::Mappings`] -- ordered table plus the phase merge policy.
//! - [`pusher::EntryPusher`] -- the rule-contributor contract.
//! - [`handler::EntryHandler`] -- owns the table, drives the pipeline,
//!   answers queries.
//! - [`snapshot::SnapshotStore`] -- per-world persistence.
//! - [`sync::SyncPacket`] -- versioned bitcode snapshot for observers.

pub mod config;
pub mod entry;
pub mod handler;
pub mod mapping;
pub mod phase;
pub mod pusher;
pub mod scan;
pub mod snapshot;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
