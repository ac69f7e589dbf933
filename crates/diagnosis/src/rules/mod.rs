//! Rule Generation for the Six-Phase Pipeline
//!
//! Translates the validated catalog into engine rules. Everything
//! here is ordinary configuration: conflict resolution and phase
//! advancement are plain rules, not engine features.

mod adjustment;
mod disease;
mod intake;
mod nutrient;
mod phases;
mod resolution;

use crate::Catalog;
use fact_store::Value;
use rule_engine::Rule;
use std::collections::BTreeMap;

/// Generate the complete rule set for a catalog
pub fn build_rules(catalog: &Catalog) -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(intake::rules());
    rules.extend(disease::rules(catalog));
    rules.extend(adjustment::rules());
    rules.extend(nutrient::rules());
    rules.extend(resolution::rules());
    rules.extend(phases::rules());
    rules
}

/// Slot-map shorthand used by rule actions
pub(crate) fn slots<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
