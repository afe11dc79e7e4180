//! Runtime constant values.

use crate::types::StackType;
use std::fmt;

/// A constant value as it appears in an instruction operand or a
/// registered runtime constant.
///
/// Values live on one of the three runtime stacks; booleans and
/// coordinates are packed into the int stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Long(i64),
    String(String),
}

impl Value {
    /// The runtime stack this value occupies.
    pub fn stack_type(&self) -> StackType {
        match self {
            Value::Int(_) => StackType::Int,
            Value::Long(_) => StackType::Long,
            Value::String(_) => StackType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_types() {
        assert_eq!(Value::Int(1).stack_type(), StackType::Int);
        assert_eq!(Value::Long(1).stack_type(), StackType::Long);
        assert_eq!(Value::from("x").stack_type(), StackType::String);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Value::Int(-1)), "-1");
        assert_eq!(format!("{}", Value::from("abc")), "abc");
    }
}
