//! Typed object values.
//!
//! A struct value pairs a named type descriptor with its field map. The set
//! of legal fields is fixed by the descriptor registered with the type
//! provider; construction validates against it, so at runtime an absent but
//! declared field reads as null while an undeclared field is an error.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error;
use crate::heap::Heap;
use crate::types::CelType;
use crate::value::Value;

/// An instance of a registered object type.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    type_desc: CelType,
    /// Declared field names, shared with every instance of the type.
    declared: Heap<FxHashSet<String>>,
    fields: Heap<FxHashMap<String, Value>>,
}

impl StructValue {
    /// Build an instance. Callers (the type provider) have already validated
    /// that every populated field is declared.
    pub fn new(
        type_desc: CelType,
        declared: Heap<FxHashSet<String>>,
        fields: FxHashMap<String, Value>,
    ) -> Self {
        StructValue {
            type_desc,
            declared,
            fields: Heap::new(fields),
        }
    }

    /// The object's type descriptor.
    pub fn type_of(&self) -> &CelType {
        &self.type_desc
    }

    /// Field read: declared-but-unset fields read as null, undeclared fields
    /// are an error.
    pub fn get(&self, field: &str) -> Value {
        if let Some(v) = self.fields.get(field) {
            return v.clone();
        }
        if self.declared.contains(field) {
            Value::Null
        } else {
            Value::error(error::no_such_field(field))
        }
    }

    /// Lookup that reports undeclared fields as `None`.
    pub fn find(&self, field: &str) -> Option<Value> {
        if let Some(v) = self.fields.get(field) {
            return Some(v.clone());
        }
        self.declared.contains(field).then_some(Value::Null)
    }

    /// Presence test: declared and populated.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Deep equality: same type name, same populated fields.
    pub fn equal(&self, other: &StructValue) -> bool {
        self.type_desc == other.type_desc
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(k, v)| other.fields.get(k).is_some_and(|ov| v.equal(ov)))
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_desc.name())?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::object_traits;
    use pretty_assertions::assert_eq;

    fn point(x: i64) -> StructValue {
        let declared: FxHashSet<String> = ["x".to_string(), "y".to_string()].into_iter().collect();
        let mut fields = FxHashMap::default();
        fields.insert("x".to_string(), Value::Int(x));
        StructValue::new(
            CelType::new("test.Point", object_traits()),
            Heap::new(declared),
            fields,
        )
    }

    #[test]
    fn declared_unset_field_reads_null() {
        let p = point(1);
        assert_eq!(p.get("x"), Value::Int(1));
        assert_eq!(p.get("y"), Value::Null);
        assert!(p.get("z").is_error());
    }

    #[test]
    fn presence_requires_population() {
        let p = point(1);
        assert!(p.has("x"));
        assert!(!p.has("y"));
        assert!(!p.has("z"));
    }

    #[test]
    fn equality_by_type_and_fields() {
        assert!(point(1).equal(&point(1)));
        assert!(!point(1).equal(&point(2)));
    }
}
