//! Map values.
//!
//! CEL maps are keyed by bool, int, uint, or string. Lookup is numeric-aware:
//! an int key and a uint key with the same numeric value address the same
//! entry, matching cross-numeric equality elsewhere in the model.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{self, ErrorValue};
use crate::heap::Heap;
use crate::value::Value;

/// A legal map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(Heap<String>),
}

impl MapKey {
    /// Build a key from a runtime value. Only bool/int/uint/string qualify.
    pub fn from_value(value: &Value) -> Result<MapKey, ErrorValue> {
        match value {
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Int(n) => Ok(MapKey::Int(*n)),
            Value::Uint(n) => Ok(MapKey::Uint(*n)),
            Value::Str(s) => Ok(MapKey::String(s.clone())),
            other => Err(error::no_such_overload(&format!(
                "map key of type {}",
                other.type_name()
            ))),
        }
    }

    /// Key string for use in key-miss diagnostics.
    pub fn display_string(&self) -> String {
        match self {
            MapKey::Bool(b) => b.to_string(),
            MapKey::Int(n) => n.to_string(),
            MapKey::Uint(n) => format!("{n}u"),
            MapKey::String(s) => s.as_str().to_string(),
        }
    }

    /// The key as a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(n) => Value::Int(*n),
            MapKey::Uint(n) => Value::Uint(*n),
            MapKey::String(s) => Value::Str(s.clone()),
        }
    }

    /// The numerically-equivalent key in the other integer domain, if any.
    ///
    /// `{1: v}` must be found by `1u` and vice versa.
    fn numeric_twin(&self) -> Option<MapKey> {
        match self {
            MapKey::Int(n) => u64::try_from(*n).ok().map(MapKey::Uint),
            MapKey::Uint(n) => i64::try_from(*n).ok().map(MapKey::Int),
            _ => None,
        }
    }
}

/// An immutable keyed map.
#[derive(Clone, Debug, PartialEq)]
pub struct MapValue {
    entries: Heap<FxHashMap<MapKey, Value>>,
}

impl MapValue {
    /// Build from key/value pairs; a repeated key keeps the last value.
    pub fn from_entries(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        let mut map = FxHashMap::default();
        for (k, v) in entries {
            map.insert(k, v);
        }
        MapValue {
            entries: Heap::new(map),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup that reports absence as `None`.
    pub fn find(&self, key: &Value) -> Option<Value> {
        let key = MapKey::from_value(key).ok()?;
        self.find_key(&key)
    }

    fn find_key(&self, key: &MapKey) -> Option<Value> {
        if let Some(v) = self.entries.get(key) {
            return Some(v.clone());
        }
        key.numeric_twin()
            .and_then(|twin| self.entries.get(&twin).cloned())
    }

    /// Indexer lookup: absence and illegal key types are in-band errors.
    pub fn get(&self, key: &Value) -> Value {
        let map_key = match MapKey::from_value(key) {
            Ok(k) => k,
            Err(e) => return Value::error(e),
        };
        match self.find_key(&map_key) {
            Some(v) => v,
            None => Value::error(error::no_such_key(&map_key.display_string())),
        }
    }

    /// Membership test for the `in` operator.
    pub fn contains_key(&self, key: &Value) -> bool {
        MapKey::from_value(key)
            .ok()
            .is_some_and(|k| self.find_key(&k).is_some())
    }

    /// Entry-count-aware deep equality with numeric key unification.
    pub fn equal(&self, other: &MapValue) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.find_key(k).is_some_and(|ov| v.equal(&ov)))
    }

    /// Iterate the keys (arbitrary order).
    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.keys()
    }
}

impl fmt::Display for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {v}", k.display_string())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> MapValue {
        MapValue::from_entries([
            (MapKey::String(Heap::new("a".to_string())), Value::Int(1)),
            (MapKey::Int(2), Value::string("two")),
        ])
    }

    #[test]
    fn lookup_hits_and_misses() {
        let m = sample();
        assert_eq!(m.get(&Value::string("a")), Value::Int(1));
        assert!(m.get(&Value::string("b")).is_error());
        assert_eq!(m.find(&Value::string("b")), None);
    }

    #[test]
    fn numeric_key_unification() {
        let m = sample();
        assert_eq!(m.get(&Value::Uint(2)), Value::string("two"));
        assert!(m.contains_key(&Value::Int(2)));
        assert!(m.contains_key(&Value::Uint(2)));
    }

    #[test]
    fn illegal_key_type_errors() {
        let m = sample();
        assert!(m.get(&Value::Double(1.0)).is_error());
        assert!(!m.contains_key(&Value::Null));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let m = MapValue::from_entries([
            (MapKey::Int(1), Value::string("first")),
            (MapKey::Int(1), Value::string("second")),
        ]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&Value::Int(1)), Value::string("second"));
    }

    #[test]
    fn map_equality_unifies_numeric_keys() {
        let a = MapValue::from_entries([(MapKey::Int(1), Value::Int(10))]);
        let b = MapValue::from_entries([(MapKey::Uint(1), Value::Int(10))]);
        assert!(a.equal(&b));
        let c = MapValue::from_entries([(MapKey::Uint(1), Value::Int(11))]);
        assert!(!a.equal(&c));
    }
}
