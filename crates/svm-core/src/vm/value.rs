//! Runtime Value Representation
//!
//! Defines the tagged values manipulated by the stack VM. Only integers
//! support arithmetic; mixing variants is an [`OperationError`], never a
//! coercion.

use std::fmt;

use crate::error::OperationError;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer, wrapping on overflow
    Integer(i64),

    /// Immutable text
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Printable form: decimal digits for integers, the raw text otherwise
    pub fn representation(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, OperationError> {
        match (self, other) {
            (Value::Integer(x), Value::Integer(y)) => Ok(Value::Integer(x.wrapping_add(*y))),
            _ => Err(self.unsupported("add", other)),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, OperationError> {
        match (self, other) {
            (Value::Integer(x), Value::Integer(y)) => Ok(Value::Integer(x.wrapping_sub(*y))),
            _ => Err(self.unsupported("subtract", other)),
        }
    }

    fn unsupported(&self, op: &'static str, other: &Value) -> OperationError {
        OperationError {
            op,
            lhs: self.type_name(),
            rhs: other.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}
