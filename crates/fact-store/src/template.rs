//! Template Schemas for Working-Memory Facts

use crate::{FieldType, StoreError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declaration of a single template field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Semantic type the field accepts
    pub field_type: FieldType,
    /// Value used when the field is omitted at assert time
    pub default: Option<Value>,
    /// Inclusive numeric bounds, e.g. CF in [-1, 1]
    pub bounds: Option<(f64, f64)>,
}

impl FieldSpec {
    /// Unbounded field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
            bounds: None,
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach inclusive numeric bounds
    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some((min, max));
        self
    }
}

/// A named schema: ordered field declarations with optional defaults
/// and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Template {
    /// Build a template, rejecting duplicate field names and defaults
    /// that violate the field's own declaration
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, StoreError> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StoreError::InvalidTemplate {
                    template: name,
                    detail: format!("duplicate field '{}'", field.name),
                });
            }
        }
        let template = Self { name, fields };
        for field in template.fields.clone() {
            if let Some(default) = &field.default {
                template.check_value(&field, default)?;
            }
        }
        Ok(template)
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field declaration by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a complete slot map against this template, filling in
    /// defaults for omitted fields. Fails with `SchemaViolation` on
    /// unknown fields, missing fields without defaults, type
    /// mismatches, and bound violations.
    pub fn materialize(
        &self,
        slots: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        for name in slots.keys() {
            if self.field(name).is_none() {
                return Err(self.violation(format!("unknown field '{name}'")));
            }
        }

        let mut out = BTreeMap::new();
        for field in &self.fields {
            let value = match slots.get(&field.name) {
                Some(v) => v.clone(),
                None => match &field.default {
                    Some(d) => d.clone(),
                    None => {
                        return Err(
                            self.violation(format!("missing field '{}'", field.name))
                        )
                    }
                },
            };
            self.check_value(field, &value)?;
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }

    /// Validate a single value against one field declaration
    pub fn check_value(&self, field: &FieldSpec, value: &Value) -> Result<(), StoreError> {
        if value.field_type() != field.field_type {
            return Err(self.violation(format!(
                "field '{}' expects {:?}, got {:?}",
                field.name,
                field.field_type,
                value.field_type()
            )));
        }
        if let Some((min, max)) = field.bounds {
            if let Some(x) = value.as_f64() {
                if x < min || x > max {
                    return Err(self.violation(format!(
                        "field '{}' value {x} is out of range [{min}, {max}]",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> StoreError {
        StoreError::SchemaViolation {
            template: self.name.clone(),
            detail,
        }
    }
}
