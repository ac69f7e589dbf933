//! Slot Value Representation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Symbolic name (disease names, severities, markers)
    Symbol,
    /// Real value (certainty factors, impact factors)
    Float,
    /// Integer value
    Integer,
    /// Ordered list of values (evidence lists)
    List,
}

/// A single slot value in a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Symbol(String),
    Float(f64),
    Integer(i64),
    List(Vec<Value>),
}

impl Value {
    /// Symbol constructor from any string-like input
    pub fn symbol(s: impl Into<String>) -> Self {
        Value::Symbol(s.into())
    }

    /// The field type this value inhabits
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Symbol(_) => FieldType::Symbol,
            Value::Float(_) => FieldType::Float,
            Value::Integer(_) => FieldType::Integer,
            Value::List(_) => FieldType::List,
        }
    }

    /// Symbol contents, if this is a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view: floats directly, integers widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// List contents, if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Symbol(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Symbol(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type() {
        assert_eq!(Value::symbol("leaf").field_type(), FieldType::Symbol);
        assert_eq!(Value::Float(0.5).field_type(), FieldType::Float);
        assert_eq!(Value::Integer(3).field_type(), FieldType::Integer);
        assert_eq!(Value::List(vec![]).field_type(), FieldType::List);
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Float(0.25).as_f64(), Some(0.25));
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::symbol("x").as_f64(), None);
    }

    #[test]
    fn test_display_list() {
        let v = Value::List(vec![Value::symbol("a"), Value::symbol("b")]);
        assert_eq!(v.to_string(), "(a b)");
    }
}
