//! Serde data file structs for goo value rules.
//!
//! Every file is a top-level table so the same struct reads from RON, JSON,
//! or TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ===========================================================================
// Values
// ===========================================================================

/// `key -> value` assertions. Used by `values`, `baseline`, and `final` files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl ValueTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

// ===========================================================================
// Denial
// ===========================================================================

/// Keys that must never receive a derived value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenyList {
    #[serde(default)]
    pub denied: Vec<String>,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A crafting rule: `inputs` make `count` of `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeData {
    pub output: String,
    #[serde(default = "default_count")]
    pub count: u32,
    /// `(key, quantity)` pairs.
    pub inputs: Vec<(String, u32)>,
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeList {
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

// ===========================================================================
// Equivalences
// ===========================================================================

/// `item` is worth `factor` times `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceData {
    pub item: String,
    pub source: String,
    #[serde(default = "default_factor")]
    pub factor: f64,
}

fn default_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceList {
    #[serde(default)]
    pub equivalences: Vec<EquivalenceData>,
}

// ===========================================================================
// Final tie-breaks
// ===========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalTable {
    /// Values for keys still unknown after convergence.
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
    /// Value given to every other key still unknown, if set.
    #[serde(default)]
    pub fill_remaining: Option<f64>,
}
