//! Rule Condition Matcher
//!
//! Evaluates ordered condition lists against a fact store, producing
//! one variable-bound activation per distinct consistent match.
//! Supports positive patterns, existential negation closed over
//! earlier bindings, and inline tests.

mod bindings;
mod condition;
mod matcher;

pub use bindings::Bindings;
pub use condition::{Condition, FieldTest, PatternSpec, PredicateFn, TestFn};
pub use matcher::match_conditions;
