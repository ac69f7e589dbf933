//! Forward-Chaining Rule Engine
//!
//! Drives the matcher/fact-store loop: a focus stack of named phases,
//! each with a salience-ordered agenda of activations, fired one at a
//! time until quiescence. Conflict resolution is expressed as
//! ordinary rules in a final phase, not an engine special case.

mod agenda;
mod engine;
mod rule;

pub use agenda::{Activation, ActivationKey};
pub use engine::{Engine, EngineConfig, RunSummary};
pub use rule::{ActionContext, ActionFn, Rule};

use fact_store::StoreError;
use thiserror::Error;

/// Errors during engine execution
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule action's store mutation was rejected
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Total firing count exceeded the configured ceiling; the fact
    /// store is preserved for inspection
    #[error("cycle budget exceeded after {fired} firings")]
    BudgetExceeded { fired: usize },

    /// Two rules share a name; agenda keys would collide
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),

    /// A rule action referenced a variable its conditions never bound
    #[error("unbound variable in rule action: {0}")]
    UnboundVariable(String),
}
