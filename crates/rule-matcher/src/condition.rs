//! Condition Elements of a Rule

use crate::Bindings;
use fact_store::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over a candidate slot value and the bindings established
/// by earlier condition elements
pub type PredicateFn = Arc<dyn Fn(&Value, &Bindings) -> bool + Send + Sync>;

/// Boolean test over the current bindings (no new bindings)
pub type TestFn = Arc<dyn Fn(&Bindings) -> bool + Send + Sync>;

/// Per-field constraint inside a pattern
#[derive(Clone)]
pub enum FieldTest {
    /// Slot must equal this literal
    Equals(Value),
    /// Bind the slot to a variable; if the variable is already bound,
    /// this degrades to an equality join against the bound value
    Bind(String),
    /// Slot must satisfy a predicate over the earlier bindings
    Satisfies(PredicateFn),
}

impl FieldTest {
    /// Equality against a symbol literal
    pub fn eq_symbol(s: impl Into<String>) -> Self {
        FieldTest::Equals(Value::symbol(s))
    }

    /// Fresh binding (or join) on a variable
    pub fn bind(var: impl Into<String>) -> Self {
        FieldTest::Bind(var.into())
    }

    /// Predicate constraint
    pub fn satisfies(
        pred: impl Fn(&Value, &Bindings) -> bool + Send + Sync + 'static,
    ) -> Self {
        FieldTest::Satisfies(Arc::new(pred))
    }
}

impl fmt::Debug for FieldTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTest::Equals(v) => write!(f, "Equals({v})"),
            FieldTest::Bind(var) => write!(f, "Bind({var})"),
            FieldTest::Satisfies(_) => write!(f, "Satisfies(..)"),
        }
    }
}

/// A template pattern: the template name, an optional fact-handle
/// variable, and per-field constraints. Unconstrained fields match
/// anything.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub template: String,
    pub fact_var: Option<String>,
    pub fields: Vec<(String, FieldTest)>,
}

impl PatternSpec {
    /// Pattern over a template with no constraints yet
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            fact_var: None,
            fields: Vec::new(),
        }
    }

    /// Capture the matched fact's handle in a variable
    pub fn capture(mut self, var: impl Into<String>) -> Self {
        self.fact_var = Some(var.into());
        self
    }

    /// Add a field constraint
    pub fn field(mut self, name: impl Into<String>, test: FieldTest) -> Self {
        self.fields.push((name.into(), test));
        self
    }
}

/// One element of a rule's ordered condition list
#[derive(Clone)]
pub enum Condition {
    /// Matches once per fact satisfying the pattern; may introduce
    /// bindings consumed by later elements
    Pattern(PatternSpec),
    /// Existential negation: true iff no fact matches the
    /// sub-pattern under the current bindings. Bindings introduced
    /// inside never escape.
    Absent(PatternSpec),
    /// Inline boolean predicate over already-bound variables
    Test(TestFn),
}

impl Condition {
    /// Inline test from a closure
    pub fn test(pred: impl Fn(&Bindings) -> bool + Send + Sync + 'static) -> Self {
        Condition::Test(Arc::new(pred))
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Pattern(p) => write!(f, "Pattern({})", p.template),
            Condition::Absent(p) => write!(f, "Absent({})", p.template),
            Condition::Test(_) => write!(f, "Test(..)"),
        }
    }
}
