//! Agenda Bookkeeping: Activation Identity, Creation Order, Refraction

use fact_store::{FactId, FactStore};
use rule_matcher::Bindings;
use std::collections::{HashMap, HashSet};

/// Stable identity of one activation: the rule name, the matched
/// facts tagged with their generation at match time, and the value
/// bindings. Modifying a matched fact changes its generation and
/// therefore yields a fresh activation, which is what lets a rule
/// refire on changed data while refraction suppresses exact repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivationKey {
    rule: String,
    facts: Vec<(String, FactId, u64)>,
    values: Vec<(String, String)>,
}

impl ActivationKey {
    /// Key for a (rule, bindings) pair against the current store
    pub fn new(rule: &str, bindings: &Bindings, store: &FactStore) -> Self {
        let facts = bindings
            .facts()
            .map(|(var, id)| {
                let generation = store.fact(id).map(|f| f.generation()).unwrap_or(0);
                (var.to_string(), id, generation)
            })
            .collect();
        let values = bindings
            .values()
            .map(|(var, value)| (var.to_string(), value.to_string()))
            .collect();
        Self {
            rule: rule.to_string(),
            facts,
            values,
        }
    }
}

/// A rule plus one satisfying binding, pending execution
#[derive(Debug, Clone)]
pub struct Activation {
    /// Index into the engine's rule list
    pub rule_index: usize,
    /// Variable bindings satisfying every condition
    pub bindings: Bindings,
    /// Identity for refraction and creation-order bookkeeping
    pub key: ActivationKey,
    /// Creation-order sequence, assigned when the activation first
    /// appeared on the agenda
    pub seq: u64,
}

/// Tracks first-seen order and fired status across re-matches.
///
/// An activation keeps its sequence number for as long as it stays
/// continuously present; once it leaves the agenda its bookkeeping is
/// dropped, so a re-derived match counts as a new activation.
#[derive(Debug, Default)]
pub struct AgendaLedger {
    seen: HashMap<ActivationKey, u64>,
    fired: HashSet<ActivationKey>,
    next_seq: u64,
}

impl AgendaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number for a key, assigning the next one on first
    /// appearance
    pub fn sequence(&mut self, key: &ActivationKey) -> u64 {
        if let Some(seq) = self.seen.get(key) {
            return *seq;
        }
        self.next_seq += 1;
        self.seen.insert(key.clone(), self.next_seq);
        self.next_seq
    }

    /// Refraction check: true if this exact activation already fired
    pub fn has_fired(&self, key: &ActivationKey) -> bool {
        self.fired.contains(key)
    }

    /// Record a firing
    pub fn mark_fired(&mut self, key: &ActivationKey) {
        self.fired.insert(key.clone());
    }

    /// Drop bookkeeping for activations no longer present anywhere
    /// on the agenda
    pub fn retain_present(&mut self, present: &HashSet<ActivationKey>) {
        self.seen.retain(|key, _| present.contains(key));
        self.fired.retain(|key| present.contains(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fact_store::{FieldSpec, FieldType, Template, Value};
    use std::collections::BTreeMap;

    fn store_with_fact() -> (FactStore, FactId) {
        let mut store = FactStore::new();
        store
            .register_template(
                Template::new(
                    "marker",
                    vec![FieldSpec::new("name", FieldType::Symbol)],
                )
                .unwrap(),
            )
            .unwrap();
        let id = store
            .assert_fact(
                "marker",
                BTreeMap::from([("name".to_string(), Value::symbol("intake"))]),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_key_changes_with_generation() {
        let (mut store, id) = store_with_fact();
        let mut bindings = Bindings::new();
        bindings.bind_fact("?m", id);

        let before = ActivationKey::new("advance", &bindings, &store);
        store
            .update(
                id,
                BTreeMap::from([("name".to_string(), Value::symbol("output"))]),
            )
            .unwrap();
        let after = ActivationKey::new("advance", &bindings, &store);
        assert_ne!(before, after);
    }

    #[test]
    fn test_sequence_is_stable_while_present() {
        let (store, id) = store_with_fact();
        let mut bindings = Bindings::new();
        bindings.bind_fact("?m", id);
        let key = ActivationKey::new("advance", &bindings, &store);

        let mut ledger = AgendaLedger::new();
        let first = ledger.sequence(&key);
        assert_eq!(ledger.sequence(&key), first);

        let mut other = Bindings::new();
        other.bind_value("?x", Value::symbol("y"));
        let key2 = ActivationKey::new("other", &other, &store);
        assert!(ledger.sequence(&key2) > first);
    }

    #[test]
    fn test_refraction_resets_when_activation_leaves() {
        let (store, id) = store_with_fact();
        let mut bindings = Bindings::new();
        bindings.bind_fact("?m", id);
        let key = ActivationKey::new("advance", &bindings, &store);

        let mut ledger = AgendaLedger::new();
        ledger.sequence(&key);
        ledger.mark_fired(&key);
        assert!(ledger.has_fired(&key));

        // Activation leaves the agenda: bookkeeping dropped
        ledger.retain_present(&HashSet::new());
        assert!(!ledger.has_fired(&key));
    }
}
