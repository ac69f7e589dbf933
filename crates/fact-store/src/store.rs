//! Session-Owned Fact Store

use crate::{StoreError, Template, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Stable fact identifier, sequential per store and never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FactId(pub u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f-{}", self.0)
    }
}

/// An immutable-identity instance of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    id: FactId,
    template: String,
    slots: BTreeMap<String, Value>,
    generation: u64,
}

impl Fact {
    /// Stable identifier
    pub fn id(&self) -> FactId {
        self.id
    }

    /// Owning template name
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Slot value by field name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.slots.get(field)
    }

    /// All slots, in field-name order
    pub fn slots(&self) -> &BTreeMap<String, Value> {
        &self.slots
    }

    /// Update counter: bumped on every successful modify. Lets the
    /// agenda distinguish a fact from its earlier versions.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Working memory for one diagnosis session. Owns all fact instances
/// and validates every mutation against the registered templates.
///
/// One store per session; never shared across sessions.
#[derive(Debug, Default)]
pub struct FactStore {
    templates: BTreeMap<String, Template>,
    facts: BTreeMap<FactId, Fact>,
    next_id: u64,
}

impl FactStore {
    /// Empty store with no templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template schema. Duplicate names are rejected.
    pub fn register_template(&mut self, template: Template) -> Result<(), StoreError> {
        if self.templates.contains_key(template.name()) {
            return Err(StoreError::DuplicateTemplate(template.name().to_string()));
        }
        self.templates.insert(template.name().to_string(), template);
        Ok(())
    }

    /// Registered template by name
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Assert a new fact. Defaults are filled in, then the full slot
    /// map is validated before the fact enters the store.
    pub fn assert_fact(
        &mut self,
        template: &str,
        slots: BTreeMap<String, Value>,
    ) -> Result<FactId, StoreError> {
        let schema = self
            .templates
            .get(template)
            .ok_or_else(|| StoreError::UnknownTemplate(template.to_string()))?;
        let slots = schema.materialize(slots)?;

        self.next_id += 1;
        let id = FactId(self.next_id);
        debug!(%id, template, "assert");
        self.facts.insert(
            id,
            Fact {
                id,
                template: template.to_string(),
                slots,
                generation: 0,
            },
        );
        Ok(id)
    }

    /// Modify field values in place. Identity is preserved; the
    /// resulting slot map must still satisfy the template.
    pub fn update(
        &mut self,
        id: FactId,
        deltas: BTreeMap<String, Value>,
    ) -> Result<FactId, StoreError> {
        let fact = self
            .facts
            .get(&id)
            .ok_or(StoreError::UnknownFact(id))?;
        let schema = self
            .templates
            .get(&fact.template)
            .ok_or_else(|| StoreError::UnknownTemplate(fact.template.clone()))?;

        let mut slots = fact.slots.clone();
        slots.extend(deltas);
        let slots = schema.materialize(slots)?;

        let fact = self.facts.get_mut(&id).ok_or(StoreError::UnknownFact(id))?;
        fact.slots = slots;
        fact.generation += 1;
        debug!(%id, template = %fact.template, generation = fact.generation, "update");
        Ok(id)
    }

    /// Remove a fact from working memory
    pub fn retract(&mut self, id: FactId) -> Result<(), StoreError> {
        let fact = self.facts.remove(&id).ok_or(StoreError::UnknownFact(id))?;
        debug!(%id, template = %fact.template, "retract");
        Ok(())
    }

    /// Fact by identifier
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    /// All facts of one template, in assertion order
    pub fn facts_of<'a>(&'a self, template: &'a str) -> impl Iterator<Item = &'a Fact> {
        self.facts.values().filter(move |f| f.template == template)
    }

    /// Lazy equality query: facts of the template whose slots match
    /// every (field, value) pair in the pattern. No ordering
    /// guarantee beyond what iteration provides.
    pub fn query<'a>(
        &'a self,
        template: &'a str,
        pattern: &'a [(String, Value)],
    ) -> impl Iterator<Item = &'a Fact> {
        self.facts_of(template)
            .filter(move |f| pattern.iter().all(|(k, v)| f.get(k) == Some(v)))
    }

    /// All facts in the store, in assertion order
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }

    /// Number of facts currently recorded
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// True when working memory is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldSpec, FieldType};

    fn store_with_symptom() -> FactStore {
        let mut store = FactStore::new();
        store
            .register_template(
                Template::new(
                    "symptom",
                    vec![
                        FieldSpec::new("name", FieldType::Symbol),
                        FieldSpec::new("cf", FieldType::Float).bounded(0.0, 1.0),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        store
    }

    fn slots(name: &str, cf: f64) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("name".to_string(), Value::symbol(name)),
            ("cf".to_string(), Value::Float(cf)),
        ])
    }

    #[test]
    fn test_assert_and_query() {
        let mut store = store_with_symptom();
        store.assert_fact("symptom", slots("yellow-halos", 0.85)).unwrap();
        store.assert_fact("symptom", slots("brown-leaf-spots", 0.85)).unwrap();

        let pattern = [("name".to_string(), Value::symbol("yellow-halos"))];
        let hits: Vec<_> = store.query("symptom", &pattern).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("cf"), Some(&Value::Float(0.85)));
    }

    #[test]
    fn test_update_preserves_identity_and_bumps_generation() {
        let mut store = store_with_symptom();
        let id = store.assert_fact("symptom", slots("wilting", 0.4)).unwrap();
        let same = store
            .update(id, BTreeMap::from([("cf".to_string(), Value::Float(0.6))]))
            .unwrap();
        assert_eq!(id, same);
        let fact = store.fact(id).unwrap();
        assert_eq!(fact.get("cf"), Some(&Value::Float(0.6)));
        assert_eq!(fact.generation(), 1);
    }

    #[test]
    fn test_update_rejects_bound_violation() {
        let mut store = store_with_symptom();
        let id = store.assert_fact("symptom", slots("wilting", 0.4)).unwrap();
        let err = store
            .update(id, BTreeMap::from([("cf".to_string(), Value::Float(2.0))]))
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaViolation { .. }));
        // Rejected update leaves the fact untouched
        assert_eq!(store.fact(id).unwrap().get("cf"), Some(&Value::Float(0.4)));
        assert_eq!(store.fact(id).unwrap().generation(), 0);
    }

    #[test]
    fn test_unknown_fact_reference() {
        let mut store = store_with_symptom();
        assert!(matches!(
            store.retract(FactId(99)),
            Err(StoreError::UnknownFact(FactId(99)))
        ));
        assert!(matches!(
            store.update(FactId(99), BTreeMap::new()),
            Err(StoreError::UnknownFact(FactId(99)))
        ));
    }

    #[test]
    fn test_ids_never_reused_after_retract() {
        let mut store = store_with_symptom();
        let a = store.assert_fact("symptom", slots("a", 0.1)).unwrap();
        store.retract(a).unwrap();
        let b = store.assert_fact("symptom", slots("b", 0.2)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_unknown_template() {
        let mut store = store_with_symptom();
        assert!(matches!(
            store.assert_fact("weather", BTreeMap::new()),
            Err(StoreError::UnknownTemplate(_))
        ));
    }
}
