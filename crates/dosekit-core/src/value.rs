//! Variable value types

use crate::context::VariableContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value stored in a [`VariableContext`]
///
/// Serializes untagged, so any JSON document maps onto it directly:
/// `null`, booleans, numbers, strings, arrays and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Explicit null (a present value, not an absent one)
    Null,

    /// Boolean value
    Bool(bool),

    /// Numeric value (all numbers are f64)
    Number(f64),

    /// String value
    String(String),

    /// Ordered sequence of values
    List(Vec<VariableValue>),

    /// Nested context
    Map(VariableContext),
}

impl VariableValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        VariableValue::String(s.into())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, VariableValue::Null)
    }

    /// Check if the value is a nested context
    pub fn is_map(&self) -> bool {
        matches!(self, VariableValue::Map(_))
    }

    /// Check if the value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, VariableValue::List(_))
    }

    /// Try to get the value as a number, without coercing strings
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) => Some(*n),
            VariableValue::Bool(true) => Some(1.0),
            VariableValue::Bool(false) => Some(0.0),
            _ => None,
        }
    }

    /// Coerce the value to a number for arithmetic
    ///
    /// `null` is 0, booleans are 1/0, numeric strings are parsed (blank is 0).
    /// Anything else is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            VariableValue::Null => 0.0,
            VariableValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            VariableValue::Number(n) => *n,
            VariableValue::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            VariableValue::List(_) | VariableValue::Map(_) => f64::NAN,
        }
    }

    /// Try to get the value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a nested context
    pub fn as_map(&self) -> Option<&VariableContext> {
        match self {
            VariableValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get the value as a list
    pub fn as_list(&self) -> Option<&[VariableValue]> {
        match self {
            VariableValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            VariableValue::Null => "null",
            VariableValue::Bool(_) => "boolean",
            VariableValue::Number(_) => "number",
            VariableValue::String(_) => "string",
            VariableValue::List(_) => "list",
            VariableValue::Map(_) => "object",
        }
    }
}

impl Default for VariableValue {
    fn default() -> Self {
        VariableValue::Null
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Null => write!(f, "null"),
            VariableValue::Bool(b) => write!(f, "{}", b),
            VariableValue::Number(n) => write!(f, "{}", n),
            VariableValue::String(s) => write!(f, "{}", s),
            VariableValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            VariableValue::Map(_) => write!(f, "[object]"),
        }
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Bool(b)
    }
}

impl From<i32> for VariableValue {
    fn from(n: i32) -> Self {
        VariableValue::Number(n as f64)
    }
}

impl From<i64> for VariableValue {
    fn from(n: i64) -> Self {
        VariableValue::Number(n as f64)
    }
}

impl From<f64> for VariableValue {
    fn from(n: f64) -> Self {
        VariableValue::Number(n)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::string(s)
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::String(s)
    }
}

impl From<VariableContext> for VariableValue {
    fn from(context: VariableContext) -> Self {
        VariableValue::Map(context)
    }
}

impl<T: Into<VariableValue>> From<Vec<T>> for VariableValue {
    fn from(items: Vec<T>) -> Self {
        VariableValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for VariableValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => VariableValue::Null,
            serde_json::Value::Bool(b) => VariableValue::Bool(b),
            serde_json::Value::Number(n) => VariableValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => VariableValue::String(s),
            serde_json::Value::Array(items) => {
                VariableValue::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => VariableValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, VariableValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(VariableValue::Number(70.5).to_number(), 70.5);
        assert_eq!(VariableValue::Bool(true).to_number(), 1.0);
        assert_eq!(VariableValue::Bool(false).to_number(), 0.0);
        assert_eq!(VariableValue::Null.to_number(), 0.0);
        assert_eq!(VariableValue::string(" 12.5 ").to_number(), 12.5);
        assert_eq!(VariableValue::string("").to_number(), 0.0);
        assert!(VariableValue::string("abc").to_number().is_nan());
        assert!(VariableValue::from(vec![1, 2]).to_number().is_nan());
    }

    #[test]
    fn test_as_number_does_not_parse_strings() {
        assert_eq!(VariableValue::string("12").as_number(), None);
        assert_eq!(VariableValue::Bool(true).as_number(), Some(1.0));
    }

    #[test]
    fn test_deserialize_untagged() {
        let value: VariableValue =
            serde_json::from_str(r#"{"a": null, "b": [1, true, "x"], "c": 2}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&VariableValue::Null));
        assert_eq!(
            map.get("b"),
            Some(&VariableValue::List(vec![
                VariableValue::Number(1.0),
                VariableValue::Bool(true),
                VariableValue::string("x"),
            ]))
        );
        assert_eq!(map.get("c"), Some(&VariableValue::Number(2.0)));
    }

    #[test]
    fn test_from_json_value() {
        let value = VariableValue::from(json!({"weight": 70, "tags": ["a"]}));
        let map = value.as_map().unwrap();
        assert_eq!(map.get("weight"), Some(&VariableValue::Number(70.0)));
        assert_eq!(map.get("tags").and_then(|v| v.as_list()).map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_serialize_null_and_numbers() {
        let value = VariableValue::List(vec![VariableValue::Null, VariableValue::Number(1.5)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[null,1.5]");
    }
}
