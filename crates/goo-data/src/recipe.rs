//! Recipe propagation (`Derived` phase).
//!
//! A recipe whose inputs are all known values its output at
//! `sum(input * quantity) / count`; with several recipes for one output the
//! cheapest wins. Recipes with missing inputs register the output and the
//! missing inputs as unknown so later passes pick them up.
//!
//! An output is written while it is unknown or only holds an equivalence
//! value. Once a recipe has valued it, it stays put: a cycle such as
//! `ingot -> 10 nugget -> ingot` would otherwise shrink its members on every
//! pass and never settle.

use crate::loader::DataLoadError;
use crate::schema::{RecipeData, RecipeList};
use crate::source::{Cached, Source};
use goo_core::entry::GooEntry;
use goo_core::mapping::Mappings;
use goo_core::phase::EntryPhase;
use goo_core::pusher::EntryPusher;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

const NAME: &str = "recipes";

#[derive(Debug)]
pub struct RecipePusher {
    rules: Cached<RecipeList>,
    /// Recipes that passed validation on the last successful load.
    valid: Vec<RecipeData>,
    buffer: Mappings,
}

impl RecipePusher {
    pub fn new(rules: Source<RecipeList>) -> Self {
        Self {
            rules: Cached::new(rules),
            valid: Vec::new(),
            buffer: Mappings::new(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Source::File {
            dir: dir.into(),
            base_name: "recipes",
        })
    }

    /// Number of recipes in use.
    pub fn recipe_count(&self) -> usize {
        self.valid.len()
    }

    fn rebuild(&mut self) {
        self.valid.clear();
        let Some(list) = self.rules.current() else {
            return;
        };
        let file = self.rules.source().location();
        for recipe in &list.recipes {
            match check(recipe) {
                Ok(()) => self.valid.push(recipe.clone()),
                Err(reason) => {
                    let err = DataLoadError::Invalid {
                        file: file.clone(),
                        name: recipe.output.clone(),
                        reason,
                    };
                    tracing::warn!(target: "pusher", pusher = NAME, error = %err, "rule_skipped");
                }
            }
        }
    }
}

fn check(recipe: &RecipeData) -> Result<(), &'static str> {
    if recipe.count == 0 {
        return Err("recipe produces nothing");
    }
    if recipe.inputs.is_empty() {
        return Err("recipe has no inputs");
    }
    Ok(())
}

/// True if `key` holds a value this phase must leave alone.
fn protected(view: &Mappings, key: &str) -> bool {
    view.get(key).is_some_and(|entry| {
        entry.is_denied() || (!entry.is_unknown() && entry.origin != Some(EntryPhase::Deferred))
    })
}

impl EntryPusher for RecipePusher {
    fn name(&self) -> &str {
        NAME
    }

    fn phase(&self) -> EntryPhase {
        EntryPhase::Derived
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
        let mut cheapest: BTreeMap<&str, f64> = BTreeMap::new();
        let mut pending: BTreeSet<&str> = BTreeSet::new();

        for recipe in &self.valid {
            let output = recipe.output.as_str();
            if protected(view, output) {
                continue;
            }
            if recipe
                .inputs
                .iter()
                .any(|(input, _)| view.get(input).is_some_and(GooEntry::is_denied))
            {
                continue;
            }

            let mut total = 0.0;
            let mut complete = true;
            for (input, quantity) in &recipe.inputs {
                match view.known_value(input) {
                    Some(value) => total += value * f64::from(*quantity),
                    None => {
                        complete = false;
                        if !view.contains(input) {
                            pending.insert(input.as_str());
                        }
                    }
                }
            }

            if complete {
                let value = total / f64::from(recipe.count);
                cheapest
                    .entry(output)
                    .and_modify(|best| *best = best.min(value))
                    .or_insert(value);
            } else {
                pending.insert(output);
            }
        }

        for key in pending {
            self.buffer.insert(key, GooEntry::unknown(EntryPhase::Derived));
        }
        for (key, value) in cheapest {
            self.buffer.insert(key, GooEntry::known(value, EntryPhase::Derived));
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
