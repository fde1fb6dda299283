//! Variable contexts
//!
//! A [`VariableContext`] is the patient/clinical parameter set a formula is
//! evaluated against. Keys are kept sorted so that two contexts holding the
//! same entries always serialize to the same text.

use crate::error::{Error, Result};
use crate::resolver;
use crate::value::VariableValue;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A mapping from variable name to [`VariableValue`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext {
    entries: BTreeMap<String, VariableValue>,
}

impl VariableContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a context from a JSON object
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<VariableValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one
    pub fn insert<K: Into<String>, V: Into<VariableValue>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<VariableValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Get a top-level value
    pub fn get(&self, key: &str) -> Option<&VariableValue> {
        self.entries.get(key)
    }

    /// Get a mutable top-level value
    pub fn get_mut(&mut self, key: &str) -> Option<&mut VariableValue> {
        self.entries.get_mut(key)
    }

    /// Remove a top-level value
    pub fn remove(&mut self, key: &str) -> Option<VariableValue> {
        self.entries.remove(key)
    }

    /// Check whether a top-level key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of top-level entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the context has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over top-level entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, VariableValue> {
        self.entries.iter()
    }

    /// Iterate over top-level keys in key order
    pub fn keys(&self) -> btree_map::Keys<'_, String, VariableValue> {
        self.entries.keys()
    }

    /// Resolve a dotted/indexed path in this context (no defaults)
    pub fn resolve(&self, path: &str) -> Option<&VariableValue> {
        resolver::resolve(path, self, None)
    }

    /// Deep-merge `other` into this context
    ///
    /// Lists replace wholesale, nested contexts merge recursively, everything
    /// else overwrites.
    pub fn merge(&mut self, other: &VariableContext) {
        for (key, incoming) in other.iter() {
            match incoming {
                VariableValue::Map(incoming_map) => match self.entries.get_mut(key) {
                    Some(VariableValue::Map(existing)) => existing.merge(incoming_map),
                    _ => {
                        let mut fresh = VariableContext::new();
                        fresh.merge(incoming_map);
                        self.entries.insert(key.clone(), VariableValue::Map(fresh));
                    }
                },
                _ => {
                    self.entries.insert(key.clone(), incoming.clone());
                }
            }
        }
    }

    /// Canonical text of this context, used as the context half of a cache
    /// fingerprint
    ///
    /// JSON-shaped with sorted keys, but lossless: numbers are written in
    /// their shortest round-trip form and non-finite numbers appear as bare
    /// `Infinity`, `-Infinity` and `NaN`, so none of them collide with
    /// `null` or with a string.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        write_canonical_map(self, &mut out);
        out
    }
}

fn write_canonical_map(context: &VariableContext, out: &mut String) {
    out.push('{');
    for (i, (key, value)) in context.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_canonical_str(key, out);
        out.push(':');
        write_canonical_value(value, out);
    }
    out.push('}');
}

fn write_canonical_value(value: &VariableValue, out: &mut String) {
    match value {
        VariableValue::Null => out.push_str("null"),
        VariableValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        VariableValue::Number(n) if n.is_nan() => out.push_str("NaN"),
        VariableValue::Number(n) if n.is_infinite() => {
            out.push_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
        }
        VariableValue::Number(n) => out.push_str(&format!("{:?}", n)),
        VariableValue::String(s) => write_canonical_str(s, out),
        VariableValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical_value(item, out);
            }
            out.push(']');
        }
        VariableValue::Map(map) => write_canonical_map(map, out),
    }
}

fn write_canonical_str(s: &str, out: &mut String) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

impl TryFrom<serde_json::Value> for VariableContext {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match VariableValue::from(value) {
            VariableValue::Map(context) => Ok(context),
            other => Err(Error::InvalidContext(other.type_name())),
        }
    }
}

impl From<BTreeMap<String, VariableValue>> for VariableContext {
    fn from(entries: BTreeMap<String, VariableValue>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<VariableValue>> FromIterator<(K, V)> for VariableContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<VariableValue>> Extend<(K, V)> for VariableContext {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for VariableContext {
    type Item = (String, VariableValue);
    type IntoIter = btree_map::IntoIter<String, VariableValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a VariableContext {
    type Item = (&'a String, &'a VariableValue);
    type IntoIter = btree_map::Iter<'a, String, VariableValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_str() {
        let ctx = VariableContext::from_json_str(r#"{"weight": 70, "name": "x"}"#).unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("weight"), Some(&VariableValue::Number(70.0)));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = VariableContext::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::InvalidContext("list")));

        assert!(matches!(
            VariableContext::from_json_str("{not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_canonical_string_is_order_independent() {
        let a = VariableContext::new().with("b", 2).with("a", 1);
        let b = VariableContext::new().with("a", 1).with("b", 2);
        assert_eq!(a.to_canonical_string(), b.to_canonical_string());
        assert_eq!(a.to_canonical_string(), r#"{"a":1.0,"b":2.0}"#);
    }

    #[test]
    fn test_canonical_string_keeps_non_finite_numbers() {
        let text = |value: VariableValue| VariableContext::new().with("x", value).to_canonical_string();

        assert_eq!(text(f64::INFINITY.into()), r#"{"x":Infinity}"#);
        assert_eq!(text(f64::NEG_INFINITY.into()), r#"{"x":-Infinity}"#);
        assert_eq!(text(f64::NAN.into()), r#"{"x":NaN}"#);
        assert_eq!(text(VariableValue::Null), r#"{"x":null}"#);
        assert_eq!(text("NaN".into()), r#"{"x":"NaN"}"#);
    }

    #[test]
    fn test_canonical_string_nested() {
        let ctx = VariableContext::try_from(json!({
            "patient": {"weight": 70.5, "name": "a\"b"},
            "doses": [1, null, true]
        }))
        .unwrap();
        assert_eq!(
            ctx.to_canonical_string(),
            r#"{"doses":[1.0,null,true],"patient":{"name":"a\"b","weight":70.5}}"#
        );
    }

    #[test]
    fn test_merge_nested() {
        let mut base = VariableContext::try_from(json!({
            "patient": {"weight": 70, "height": 170},
            "values": [1, 2, 3]
        }))
        .unwrap();
        let overlay = VariableContext::try_from(json!({
            "patient": {"weight": 72},
            "values": [4]
        }))
        .unwrap();

        base.merge(&overlay);

        assert_eq!(
            base,
            VariableContext::try_from(json!({
                "patient": {"weight": 72, "height": 170},
                "values": [4]
            }))
            .unwrap()
        );
    }

    #[test]
    fn test_merge_map_over_scalar() {
        let mut base = VariableContext::new().with("patient", "unknown");
        let overlay = VariableContext::try_from(json!({"patient": {"age": 40}})).unwrap();
        base.merge(&overlay);
        assert_eq!(base.resolve("patient.age"), Some(&VariableValue::Number(40.0)));
    }
}
