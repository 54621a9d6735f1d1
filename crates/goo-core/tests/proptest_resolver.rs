//! Property-based tests for the resolver.
//!
//! Uses proptest to generate random offer sequences and random acyclic rule
//! sets, then verifies the merge policy and convergence invariants hold.

use goo_core::config::ResolverConfig;
use goo_core::entry::GooEntry;
use goo_core::handler::EntryHandler;
use goo_core::mapping::Mappings;
use goo_core::phase::{EntryPhase, SolvedState};
use goo_core::snapshot::MemoryStore;
use goo_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_phase() -> impl Strategy<Value = EntryPhase> {
    prop_oneof![
        Just(EntryPhase::Initialize),
        Just(EntryPhase::Baseline),
        Just(EntryPhase::Denied),
        Just(EntryPhase::Derived),
        Just(EntryPhase::Deferred),
        Just(EntryPhase::Final),
    ]
}

/// (phase, key index, candidate). Denied-phase offers always carry the marker.
fn arb_offer() -> impl Strategy<Value = (EntryPhase, usize, GooEntry)> {
    (arb_phase(), 0..6usize, any::<bool>(), 0.0..100.0f64).prop_map(
        |(phase, key, unknown, value)| {
            let entry = if phase == EntryPhase::Denied {
                GooEntry::denied()
            } else if unknown {
                GooEntry::unknown(phase)
            } else {
                GooEntry::known(value, phase)
            };
            (phase, key, entry)
        },
    )
}

/// A random DAG: node `i` depends on a subset of nodes `< i`. Nodes without
/// dependencies are roots with a baseline value. Each rule is assigned to
/// `Derived` or `Deferred`.
#[derive(Debug, Clone)]
struct Rule {
    deps: Vec<usize>,
    deferred: bool,
}

fn arb_dag(max_nodes: usize) -> impl Strategy<Value = Vec<Rule>> {
    (1..=max_nodes).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                (
                    proptest::collection::vec(0..i.max(1), 0..=i.min(3)),
                    any::<bool>(),
                )
                    .prop_map(move |(mut deps, deferred)| {
                        if i == 0 {
                            deps.clear();
                        }
                        deps.sort_unstable();
                        deps.dedup();
                        Rule { deps, deferred }
                    })
            })
            .collect::<Vec<_>>()
    })
}

fn key(i: usize) -> String {
    format!("goo:n{i:03}")
}

/// Offers `rules` (filtered to one phase) as a single closure pusher body.
fn rule_body(rules: Vec<Rule>, deferred: bool) -> impl FnMut(&Mappings, &mut Mappings) {
    let phase = if deferred {
        EntryPhase::Deferred
    } else {
        EntryPhase::Derived
    };
    move |view, out| {
        for (i, rule) in rules.iter().enumerate() {
            if rule.deps.is_empty() || rule.deferred != deferred {
                continue;
            }
            let inputs: Option<Vec<f64>> =
                rule.deps.iter().map(|&d| view.known_value(&key(d))).collect();
            match inputs {
                Some(values) => out.insert(
                    key(i),
                    GooEntry::known(1.0 + values.iter().sum::<f64>(), phase),
                ),
                None => out.insert(key(i), GooEntry::unknown(phase)),
            }
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No offer sequence turns a known key unknown, and only the Denied
    /// phase rewrites a denied key.
    #[test]
    fn offers_are_monotonic(offers in proptest::collection::vec(arb_offer(), 1..60)) {
        let mut m = Mappings::new();
        for (phase, k, candidate) in offers {
            let name = key(k);
            let before = m.get(&name).copied();
            m.offer(phase, &name, candidate);
            let after = m.get(&name).copied().unwrap();

            if let Some(before) = before {
                if !before.is_unknown() {
                    prop_assert!(!after.is_unknown());
                }
                if before.is_denied() && phase != EntryPhase::Denied {
                    prop_assert!(after.same_as(&before));
                }
                if !before.is_unknown() && phase.is_derivative()
                    && !before.origin.is_some_and(EntryPhase::is_derivative)
                {
                    prop_assert!(after.same_as(&before));
                }
            }
        }
    }

    /// An acyclic rule set converges within |keys| outer passes and leaves
    /// nothing derivable unknown.
    #[test]
    fn acyclic_rules_converge(rules in arb_dag(24)) {
        let n = rules.len();
        let mut h = EntryHandler::new(MemoryStore::new(), ResolverConfig::default());

        let roots: Vec<usize> = (0..n).filter(|&i| rules[i].deps.is_empty()).collect();
        h.register(FnPusher::<Tag1>::new(EntryPhase::Baseline, move |_, out| {
            for &r in &roots {
                out.insert(key(r), GooEntry::known(1.0, EntryPhase::Baseline));
            }
        }));
        h.register(FnPusher::<Tag2>::new(EntryPhase::Derived, rule_body(rules.clone(), false)));
        h.register(FnPusher::<Tag3>::new(EntryPhase::Deferred, rule_body(rules.clone(), true)));

        let report = h.reload_mappings(false, false).unwrap();

        prop_assert_eq!(report.solved, SolvedState::Solved);
        prop_assert!(report.outer_passes <= n.max(1));
        prop_assert_eq!(h.values().len(), n);
        for (i, rule) in rules.iter().enumerate() {
            let expected = 1.0 + rule.deps.iter().map(|&d| h.get(&key(d)).value).sum::<f64>();
            let expected = if rule.deps.is_empty() { 1.0 } else { expected };
            prop_assert_eq!(h.get(&key(i)).value, expected);
        }
    }
}
