//! The resolver: owns the authoritative table and drives the phased
//! fixed-point pipeline.
//!
//! # Reload pipeline
//!
//! [`EntryHandler::reload_mappings`] runs, in order:
//!
//! 1. **Init** -- clear the table on factory reset or regeneration.
//! 2. **Seed** -- `Initialize`, `Baseline`, `Denied` pushers, once each.
//! 3. **Merge persisted** -- unless resetting, fill gaps from the world's
//!    snapshot without replacing any freshly seeded known value.
//! 4. If a snapshot was merged and nothing is unknown, stop. The snapshot
//!    was sufficient.
//! 5. **Converge** -- cycle `Derived` and `Deferred` until a full outer pass
//!    changes nothing.
//! 6. **Finalize** -- `Final` pushers, exactly once, then the scan hook.
//! 7. **Persist** -- overwrite the world's snapshot.
//!
//! A handler serves one world. It is not internally synchronized: a host
//! that shares it across threads treats `reload_mappings` as a single
//! critical section and takes a read lock for queries on the same lock.

use crate::config::ResolverConfig;
use crate::entry::GooEntry;
use crate::mapping::Mappings;
use crate::phase::{DERIVATIVE_PHASES, EntryPhase, ProgressState, SEED_PHASES, SolvedState};
use crate::pusher::{EntryPusher, PusherSet};
use crate::scan::{MappingScan, NoopScan};
use crate::snapshot::{FileStore, PersistError, SnapshotStore};
use crate::sync::SyncPacket;
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors and reports
// ---------------------------------------------------------------------------

/// Errors that can occur during a reload.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A convergence loop hit its pass cap. The table was still finalized
    /// and persisted.
    #[error("convergence cap of {passes} passes exceeded in {} loop; {} keys still unknown", loop_label(.phase), .unknown.len())]
    NonConvergence {
        /// The inner phase that stalled, or `None` for the outer loop.
        phase: Option<EntryPhase>,
        passes: usize,
        unknown: Vec<String>,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

fn loop_label(phase: &Option<EntryPhase>) -> &'static str {
    phase.map_or("outer", EntryPhase::as_str)
}

/// Outcome of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    pub solved: SolvedState,
    /// Whether the convergence loop ran at all.
    pub converged: bool,
    /// Outer passes taken by the convergence loop. Zero if it was skipped.
    pub outer_passes: usize,
    /// Whether the snapshot was rewritten.
    pub persisted: bool,
}

// ---------------------------------------------------------------------------
// EntryHandler
// ---------------------------------------------------------------------------

/// Resolves goo equivalency values for one world.
#[derive(Debug)]
pub struct EntryHandler<S: SnapshotStore = FileStore> {
    mappings: Mappings,
    pushers: PusherSet,
    store: S,
    config: ResolverConfig,
    scan: Box<dyn MappingScan>,
}

impl EntryHandler<FileStore> {
    /// A handler persisting to the configured snapshot file in `world_dir`.
    pub fn for_world(world_dir: &Path, config: ResolverConfig) -> Self {
        let store = FileStore::for_world(world_dir, &config);
        Self::new(store, config)
    }
}

impl<S: SnapshotStore> EntryHandler<S> {
    pub fn new(store: S, config: ResolverConfig) -> Self {
        Self {
            mappings: Mappings::new(),
            pushers: PusherSet::new(),
            store,
            config,
            scan: Box::new(NoopScan),
        }
    }

    // -- Registration --

    /// Add a pusher to the pool used by every future reload. Registering a
    /// second pusher of the same type replaces the first.
    pub fn register<P: EntryPusher>(&mut self, pusher: P) {
        self.pushers.register(pusher);
    }

    pub fn pusher<P: EntryPusher>(&self) -> Option<&P> {
        self.pushers.get::<P>()
    }

    pub fn pusher_mut<P: EntryPusher>(&mut self) -> Option<&mut P> {
        self.pushers.get_mut::<P>()
    }

    pub fn pusher_count(&self) -> usize {
        self.pushers.len()
    }

    /// Replace the post-convergence scan hook.
    pub fn set_scan(&mut self, scan: impl MappingScan + 'static) {
        self.scan = Box::new(scan);
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -- Reload --

    /// Rebuild the table: seed, merge the snapshot, and converge if needed.
    ///
    /// `factory_reset` ignores the snapshot and every pusher's cached state.
    /// `regenerating` ignores the snapshot but lets pushers keep caches.
    pub fn reload_mappings(
        &mut self,
        factory_reset: bool,
        regenerating: bool,
    ) -> Result<ReloadReport, ResolveError> {
        let resetting = factory_reset || regenerating;
        if resetting {
            self.mappings.clear();
        }

        for phase in SEED_PHASES {
            self.run_phase_once(phase, factory_reset, regenerating);
        }

        let mut restored = false;
        if !resetting {
            match self.store.load() {
                Some(persisted) => {
                    let progress = self.mappings.tracked_push(persisted);
                    restored = true;
                    tracing::debug!(
                        target: "resolver",
                        improved = progress.improved(),
                        "snapshot_merged"
                    );
                }
                None => tracing::debug!(target: "resolver", "snapshot_absent"),
            }
        }

        // Without a snapshot the seed alone says nothing about derivable keys.
        if restored && self.mappings.solved_state() == SolvedState::Solved {
            tracing::info!(
                target: "resolver",
                entries = self.mappings.len(),
                "reload_solved_without_convergence"
            );
            return Ok(ReloadReport {
                solved: SolvedState::Solved,
                converged: false,
                outer_passes: 0,
                persisted: false,
            });
        }

        let convergence = self.converge(factory_reset, regenerating);

        self.run_phase_once(EntryPhase::Final, factory_reset, regenerating);
        self.scan.scan(&self.mappings);
        self.store.save(&self.mappings)?;

        let solved = self.mappings.solved_state();
        let outer_passes = convergence?;
        tracing::info!(
            target: "resolver",
            entries = self.mappings.len(),
            unknown = self.mappings.unknown_keys().len(),
            outer_passes,
            "reload_converged"
        );
        Ok(ReloadReport {
            solved,
            converged: true,
            outer_passes,
            persisted: true,
        })
    }

    /// Runs every pusher of `phase` once, registration order.
    fn run_phase_once(&mut self, phase: EntryPhase, factory_reset: bool, regenerating: bool) {
        let mut progress = ProgressState::Stagnant;
        let selected = self.pushers.indices_in(phase);
        for &index in &selected {
            progress = progress.merge(self.run_pusher(index, factory_reset, regenerating));
        }
        tracing::debug!(
            target: "resolver",
            phase = phase.as_str(),
            pushers = selected.len(),
            improved = progress.improved(),
            "phase_ran"
        );
    }

    fn run_pusher(&mut self, index: usize, factory_reset: bool, regenerating: bool) -> ProgressState {
        let pusher = self.pushers.at_mut(index);
        pusher.initialize(factory_reset, regenerating);
        pusher.process(&self.mappings);
        pusher.push_to(&mut self.mappings)
    }

    /// Nested fixed-point loop over the derivative phases. Returns the
    /// number of outer passes taken.
    fn converge(&mut self, factory_reset: bool, regenerating: bool) -> Result<usize, ResolveError> {
        let mut outer_passes = 0;
        loop {
            if outer_passes >= self.config.max_outer_passes {
                return Err(self.stalled(None, outer_passes));
            }
            outer_passes += 1;
            let mut outer = ProgressState::Stagnant;

            for phase in DERIVATIVE_PHASES {
                let selected: Vec<usize> = self
                    .pushers
                    .indices_in(phase)
                    .into_iter()
                    .filter(|&i| factory_reset || !self.pushers.at(i).is_resolved())
                    .collect();

                let mut inner_passes = 0;
                loop {
                    if inner_passes >= self.config.max_inner_passes {
                        return Err(self.stalled(Some(phase), inner_passes));
                    }
                    inner_passes += 1;

                    let mut inner = ProgressState::Stagnant;
                    for &index in &selected {
                        inner = inner.merge(self.run_pusher(index, factory_reset, regenerating));
                    }
                    outer = outer.merge(inner);
                    if !inner.improved() {
                        break;
                    }
                }
                tracing::debug!(
                    target: "resolver",
                    phase = phase.as_str(),
                    pushers = selected.len(),
                    inner_passes,
                    outer_pass = outer_passes,
                    "phase_settled"
                );
            }

            if !outer.improved() {
                return Ok(outer_passes);
            }
        }
    }

    fn stalled(&self, phase: Option<EntryPhase>, passes: usize) -> ResolveError {
        let unknown = self.mappings.unknown_keys();
        tracing::error!(
            target: "resolver",
            phase = loop_label(&phase),
            passes,
            unknown = ?unknown,
            "convergence_cap_exceeded"
        );
        ResolveError::NonConvergence {
            phase,
            passes,
            unknown,
        }
    }

    // -- Queries --

    /// The entry for `key`, or [`GooEntry::UNKNOWN`]. Never fails.
    pub fn get(&self, key: &str) -> GooEntry {
        self.mappings.get_or_unknown(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.mappings.contains(key)
    }

    /// The whole table, ascending by key.
    pub fn values(&self) -> &Mappings {
        &self.mappings
    }

    pub fn solved_state(&self) -> SolvedState {
        self.mappings.solved_state()
    }

    pub fn unknown_keys(&self) -> Vec<String> {
        self.mappings.unknown_keys()
    }

    // -- Sync --

    pub fn create_packet(&self) -> SyncPacket {
        SyncPacket::from_mappings(&self.mappings)
    }

    /// Replace the table wholesale with an authoritative snapshot.
    pub fn from_packet(&mut self, packet: SyncPacket) {
        self.mappings = packet.into_mappings();
    }
}
