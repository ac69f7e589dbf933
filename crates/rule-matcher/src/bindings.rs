//! Variable Bindings for One Activation

use fact_store::{FactId, Value};
use std::collections::BTreeMap;

/// Variable environment accumulated while matching one rule's
/// conditions: value variables bound by field tests, plus fact
/// handles bound by pattern head variables.
///
/// Backed by ordered maps so two equal binding sets always compare
/// and render identically (agenda keys depend on this).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
    facts: BTreeMap<String, FactId>,
}

impl Bindings {
    /// Empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to a variable, if any
    pub fn value(&self, var: &str) -> Option<&Value> {
        self.values.get(var)
    }

    /// Numeric view of a bound value
    pub fn number(&self, var: &str) -> Option<f64> {
        self.value(var).and_then(Value::as_f64)
    }

    /// Symbol view of a bound value
    pub fn symbol(&self, var: &str) -> Option<&str> {
        self.value(var).and_then(Value::as_symbol)
    }

    /// Fact handle bound to a pattern variable, if any
    pub fn fact(&self, var: &str) -> Option<FactId> {
        self.facts.get(var).copied()
    }

    /// Bind a value variable (overwrites any previous binding; the
    /// matcher checks consistency before calling this)
    pub fn bind_value(&mut self, var: impl Into<String>, value: Value) {
        self.values.insert(var.into(), value);
    }

    /// Bind a fact handle to a pattern variable
    pub fn bind_fact(&mut self, var: impl Into<String>, id: FactId) {
        self.facts.insert(var.into(), id);
    }

    /// Value bindings in variable order
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fact bindings in variable order
    pub fn facts(&self) -> impl Iterator<Item = (&str, FactId)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
