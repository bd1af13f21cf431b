//! Value Model for the Selector Compiler
//!
//! State and props are plain key-value data. Compound values are reference
//! counted so that "the same object" has a meaning: two `List`/`Map` values are
//! identical only when they share the same allocation. Memoization relies on
//! this to decide cache hits with a shallow comparison.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub enum Value {
    /// No value at all (missing property, missing props).
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<IndexMap<String, Value>>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }

    pub fn empty_list() -> Self {
        Value::list(Vec::new())
    }

    pub fn empty_map() -> Self {
        Value::map(IndexMap::new())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Own property read. Anything that is not a map has no properties.
    pub fn get(&self, property: &str) -> Value {
        match self {
            Value::Map(entries) => entries.get(property).cloned().unwrap_or_default(),
            _ => Value::Absent,
        }
    }

    /// Own property read that treats an `Absent` entry as missing.
    pub fn get_defined(&self, property: &str) -> Option<&Value> {
        self.as_map()
            .and_then(|entries| entries.get(property))
            .filter(|value| !value.is_absent())
    }

    /// Dynamic lookup by a key value, as used for props-keyed selectors.
    ///
    /// Maps are indexed by string keys (numbers are stringified), lists by
    /// non-negative integral numbers or their string form.
    pub fn index(&self, key: &Value) -> Value {
        match self {
            Value::Map(entries) => key
                .as_property_key()
                .and_then(|k| entries.get(&k).cloned())
                .unwrap_or_default(),
            Value::List(items) => key
                .as_list_index()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
            _ => Value::Absent,
        }
    }

    fn as_property_key(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some("null".to_string()),
            _ => None,
        }
    }

    fn as_list_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            Value::String(s) => s.parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Absent | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY & SHALLOW EQUALITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity comparison: scalars by value, compound values by allocation.
pub fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// One level deep comparison used as the memoization cache key test.
///
/// Two compound values are equal when they hold the same keys (or the same
/// number of items) and every member is `identical`. A compound value never
/// equals a scalar.
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Map(x), Value::Map(y)) => {
            Arc::ptr_eq(x, y)
                || (x.len() == y.len()
                    && x
                        .iter()
                        .all(|(k, v)| y.get(k).is_some_and(|w| identical(v, w))))
        }
        (Value::List(x), Value::List(y)) => {
            Arc::ptr_eq(x, y)
                || (x.len() == y.len() && x.iter().zip(y.iter()).all(|(v, w)| identical(v, w)))
        }
        (Value::Map(_) | Value::List(_), _) | (_, Value::Map(_) | Value::List(_)) => false,
        _ => identical(a, b),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(Arc::from(s)),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::map(entries)
    }
}

/// Structural equality, used by tests and callers comparing contents.
/// Memoization never uses this; see [`shallow_equal`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y) || x == y,
            (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y) || x == y,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "absent"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shallow_equal_same_members() {
        let shared = Value::from(json!([1, 2]));
        let mut a = IndexMap::new();
        a.insert("items".to_string(), shared.clone());
        a.insert("id".to_string(), Value::from("x"));
        let mut b = IndexMap::new();
        b.insert("items".to_string(), shared);
        b.insert("id".to_string(), Value::from("x"));

        assert!(shallow_equal(&Value::map(a), &Value::map(b)));
    }

    #[test]
    fn test_shallow_equal_rejects_rebuilt_members() {
        let a = Value::from(json!({ "items": [1, 2] }));
        let b = Value::from(json!({ "items": [1, 2] }));

        assert!(!shallow_equal(&a, &b));
        assert_eq!(a, b, "structurally equal all the same");
    }

    #[test]
    fn test_shallow_equal_key_count_and_kinds() {
        let a = Value::from(json!({ "a": 1 }));
        let b = Value::from(json!({ "a": 1, "b": 2 }));
        assert!(!shallow_equal(&a, &b));
        assert!(!shallow_equal(&a, &Value::Null));
        assert!(shallow_equal(&Value::from(3i64), &Value::from(3.0)));
        assert!(shallow_equal(&Value::Absent, &Value::Absent));
        assert!(!shallow_equal(&Value::Absent, &Value::Null));
    }

    #[test]
    fn test_index_lookup() {
        let items = Value::from(json!({ "x": 1, "7": 2 }));
        assert_eq!(items.index(&Value::from("x")), Value::from(1i64));
        assert_eq!(items.index(&Value::from(7i64)), Value::from(2i64));
        assert!(items.index(&Value::from("missing")).is_absent());

        let list = Value::from(json!(["a", "b"]));
        assert_eq!(list.index(&Value::from(1i64)), Value::from("b"));
        assert!(list.index(&Value::from(-1i64)).is_absent());
    }

    #[test]
    fn test_get_defined_skips_absent() {
        let mut entries = IndexMap::new();
        entries.insert("gone".to_string(), Value::Absent);
        entries.insert("nothing".to_string(), Value::Null);
        let value = Value::map(entries);

        assert!(value.get_defined("gone").is_none());
        assert_eq!(value.get_defined("nothing"), Some(&Value::Null));
        assert!(Value::from(3i64).get_defined("anything").is_none());
    }
}
