//! Values exchanged between callers and drivers.

use core::fmt;
use serde::Serialize;

/// A single argument or column value.
///
/// Serialized untagged so hooks can log argument lists as plain JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// The kind of a [`Value`], used by drivers to describe column scan types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// SQL `NULL`.
    Null,
    /// A boolean.
    Bool,
    /// A signed 64-bit integer.
    Int,
    /// A 64-bit float.
    Float,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

/// An argument with its optional name and 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    /// The parameter name, if the caller bound it by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The 1-based position of the argument.
    pub ordinal: usize,
    /// The argument value.
    pub value: Value,
}

impl NamedValue {
    /// Creates a positional argument.
    #[must_use]
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    /// Creates a named argument.
    #[must_use]
    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Returns the name if present, otherwise the ordinal as a string.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.ordinal.to_string(),
        }
    }
}

/// Converts positional values into named values with 1-based ordinals.
#[must_use]
pub fn to_named(values: &[Value]) -> Vec<NamedValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| NamedValue::positional(i + 1, value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Int(7));
    }

    #[test]
    fn named_value_key_prefers_name() {
        assert_eq!(NamedValue::named("id", 1, 1_i64).key(), "id");
        assert_eq!(NamedValue::positional(2, 1_i64).key(), "2");
        assert_eq!(NamedValue::named("", 3, 1_i64).key(), "3");
    }

    #[test]
    fn to_named_assigns_one_based_ordinals() {
        let named = to_named(&[Value::from("a"), Value::Null]);
        assert_eq!(named[0].ordinal, 1);
        assert_eq!(named[1].ordinal, 2);
        assert!(named[1].value.is_null());
    }

    #[test]
    fn values_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Int(1),
            Value::from("x"),
            Value::Null,
        ])
        .unwrap();
        assert_eq!(json, r#"[1,"x",null]"#);
    }
}
