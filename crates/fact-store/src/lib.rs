//! Typed Working-Memory Fact Store
//!
//! Provides template-validated fact storage with stable identity,
//! bound enforcement at assert/update time, and equality queries.

mod store;
mod template;
mod value;

pub use store::{Fact, FactId, FactStore};
pub use template::{FieldSpec, Template};
pub use value::{FieldType, Value};

use thiserror::Error;

/// Errors raised by fact-store operations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Field value violates the template's declared type or bound
    #[error("schema violation on template '{template}': {detail}")]
    SchemaViolation { template: String, detail: String },

    /// Update or retract referenced a fact that does not exist
    #[error("unknown fact reference: {0}")]
    UnknownFact(FactId),

    /// Template name not registered with this store
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// A template with the same name is already registered
    #[error("duplicate template: {0}")]
    DuplicateTemplate(String),

    /// Template declaration itself is malformed
    #[error("invalid template '{template}': {detail}")]
    InvalidTemplate { template: String, detail: String },
}
