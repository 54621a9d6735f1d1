//! Phase taxonomy and the two-valued progress/solved states.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntryPhase
// ---------------------------------------------------------------------------

/// When a pusher runs relative to the others.
///
/// The declaration order is the run order. A pusher's phase is fixed when it
/// is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPhase {
    /// Seeds raw known values.
    Initialize,
    /// Applies default or fallback values to keys that have none.
    Baseline,
    /// Marks excluded keys so derivation never overwrites them.
    Denied,
    /// Values directly inferable from already-known entries.
    Derived,
    /// Values that wait on other derived values.
    Deferred,
    /// Runs once after convergence. Never re-entered.
    Final,
}

/// Phases run once, in order, at the start of every reload.
pub const SEED_PHASES: [EntryPhase; 3] =
    [EntryPhase::Initialize, EntryPhase::Baseline, EntryPhase::Denied];

/// Phases cycled by the convergence loop. `Final` is deliberately absent.
pub const DERIVATIVE_PHASES: [EntryPhase; 2] = [EntryPhase::Derived, EntryPhase::Deferred];

impl EntryPhase {
    /// Whether this phase belongs to the derivative (convergence) category.
    pub fn is_derivative(self) -> bool {
        matches!(self, EntryPhase::Derived | EntryPhase::Deferred)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryPhase::Initialize => "initialize",
            EntryPhase::Baseline => "baseline",
            EntryPhase::Denied => "denied",
            EntryPhase::Derived => "derived",
            EntryPhase::Deferred => "deferred",
            EntryPhase::Final => "final",
        }
    }
}

// ---------------------------------------------------------------------------
// Progress / solved
// ---------------------------------------------------------------------------

/// Did a push change the authoritative mapping?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Improved,
    Stagnant,
}

impl ProgressState {
    /// Combine two results. `Improved` dominates.
    pub fn merge(self, other: ProgressState) -> ProgressState {
        if self == ProgressState::Improved || other == ProgressState::Improved {
            ProgressState::Improved
        } else {
            ProgressState::Stagnant
        }
    }

    pub fn improved(self) -> bool {
        self == ProgressState::Improved
    }
}

/// Are there zero entries still marked unknown?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvedState {
    Solved,
    Unsolved,
}
