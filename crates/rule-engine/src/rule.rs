//! Rule Definitions and Action Execution Context

use crate::EngineError;
use fact_store::{FactId, FactStore, Value};
use rule_matcher::{Bindings, Condition};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A rule's action: a sequence of fact-store mutations plus pure CF
/// computations, run against the activation's bindings
pub type ActionFn = Arc<dyn Fn(&mut ActionContext<'_>) -> Result<(), EngineError> + Send + Sync>;

/// A production rule: identifier, owning phase, salience, ordered
/// condition list, and an action
#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub phase: String,
    pub salience: i32,
    pub conditions: Vec<Condition>,
    pub action: ActionFn,
}

impl Rule {
    /// Build a rule from its parts
    pub fn new(
        name: impl Into<String>,
        phase: impl Into<String>,
        salience: i32,
        conditions: Vec<Condition>,
        action: impl Fn(&mut ActionContext<'_>) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            phase: phase.into(),
            salience,
            conditions,
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("salience", &self.salience)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

/// Execution context handed to a firing rule's action. Exposes the
/// activation's bindings, store mutations, and focus pushes.
pub struct ActionContext<'a> {
    store: &'a mut FactStore,
    bindings: &'a Bindings,
    pushes: Vec<String>,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(store: &'a mut FactStore, bindings: &'a Bindings) -> Self {
        Self {
            store,
            bindings,
            pushes: Vec::new(),
        }
    }

    pub(crate) fn into_pushes(self) -> Vec<String> {
        self.pushes
    }

    /// The activation's variable bindings
    pub fn bindings(&self) -> &Bindings {
        self.bindings
    }

    /// Numeric value bound to a variable
    pub fn number(&self, var: &str) -> Option<f64> {
        self.bindings.number(var)
    }

    /// Symbol bound to a variable
    pub fn symbol(&self, var: &str) -> Option<&str> {
        self.bindings.symbol(var)
    }

    /// Fact handle bound to a pattern variable
    pub fn fact(&self, var: &str) -> Option<FactId> {
        self.bindings.fact(var)
    }

    /// Numeric binding, or `UnboundVariable` if the conditions never
    /// bound it to a number
    pub fn require_number(&self, var: &str) -> Result<f64, EngineError> {
        self.number(var)
            .ok_or_else(|| EngineError::UnboundVariable(var.to_string()))
    }

    /// Symbol binding as an owned string
    pub fn require_symbol(&self, var: &str) -> Result<String, EngineError> {
        self.symbol(var)
            .map(str::to_string)
            .ok_or_else(|| EngineError::UnboundVariable(var.to_string()))
    }

    /// Fact-handle binding
    pub fn require_fact(&self, var: &str) -> Result<FactId, EngineError> {
        self.fact(var)
            .ok_or_else(|| EngineError::UnboundVariable(var.to_string()))
    }

    /// Assert a new fact
    pub fn assert_fact(
        &mut self,
        template: &str,
        slots: BTreeMap<String, Value>,
    ) -> Result<FactId, EngineError> {
        Ok(self.store.assert_fact(template, slots)?)
    }

    /// Modify a fact bound to a pattern variable
    pub fn update(
        &mut self,
        id: FactId,
        deltas: BTreeMap<String, Value>,
    ) -> Result<FactId, EngineError> {
        Ok(self.store.update(id, deltas)?)
    }

    /// Retract a fact
    pub fn retract(&mut self, id: FactId) -> Result<(), EngineError> {
        Ok(self.store.retract(id)?)
    }

    /// Read access to working memory (for explanation assembly)
    pub fn store(&self) -> &FactStore {
        self.store
    }

    /// Push a phase onto the focus stack once this action returns
    pub fn push_focus(&mut self, phase: impl Into<String>) {
        self.pushes.push(phase.into());
    }
}
