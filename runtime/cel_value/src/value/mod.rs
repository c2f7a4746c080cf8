//! Runtime values.
//!
//! [`Value`] is the closed universe of CEL runtime values. Scalars are stored
//! inline; composite payloads live behind [`Heap`] and are only constructed
//! through the factory methods here, so every value is immutable and O(1) to
//! clone.
//!
//! Errors and unknowns are values too: operations return them in-band rather
//! than through `Result`, which is what lets non-strict operators inspect and
//! absorb a failing side.

mod arith;
mod iter;
mod map;
mod object;
pub mod time;

pub use iter::ValueIterator;
pub use map::{MapKey, MapValue};
pub use object::StructValue;

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::error::{self, ErrorValue};
use crate::heap::Heap;
use crate::types::{self, CelType};
use crate::unknown::UnknownSet;

/// A CEL runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// JSON-style null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    Uint(u64),
    /// IEEE-754 double.
    Double(f64),
    /// UTF-8 string.
    Str(Heap<String>),
    /// Byte string.
    Bytes(Heap<Vec<u8>>),
    /// Signed duration with nanosecond precision.
    Duration(TimeDelta),
    /// Point in time with a preserved UTC offset.
    Timestamp(DateTime<FixedOffset>),
    /// Ordered list of values.
    List(Heap<Vec<Value>>),
    /// Keyed map.
    Map(MapValue),
    /// Typed object built through the type provider.
    Struct(StructValue),
    /// Optional: present or absent.
    Optional(Heap<Option<Value>>),
    /// A type used as a value (`type(x)`, `uint`, …).
    Type(CelType),
    /// Resolution could not complete; carries the blocking node ids.
    Unknown(UnknownSet),
    /// Evaluation failure travelling as a value.
    Error(Heap<ErrorValue>),
}

// Factory methods: the only construction path for heap payloads.

impl Value {
    /// String value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Bytes value.
    #[inline]
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(Heap::new(b.into()))
    }

    /// List value.
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Map value from key/value pairs; a repeated key keeps the last value.
    pub fn map(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        Value::Map(MapValue::from_entries(entries))
    }

    /// Present optional.
    #[inline]
    pub fn optional_of(value: Value) -> Self {
        Value::Optional(Heap::new(Some(value)))
    }

    /// Absent optional.
    #[inline]
    pub fn optional_none() -> Self {
        Value::Optional(Heap::new(None))
    }

    /// Error value.
    #[inline]
    pub fn error(err: ErrorValue) -> Self {
        Value::Error(Heap::new(err))
    }

    /// Unknown rooted at one expression id.
    #[inline]
    pub fn unknown(id: i64) -> Self {
        Value::Unknown(UnknownSet::new(id))
    }
}

// Predicates and accessors.

impl Value {
    /// Whether this is an error value.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Whether this is an unknown value.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    /// Whether this is an error or an unknown — the two propagating states.
    #[inline]
    pub fn is_unknown_or_error(&self) -> bool {
        matches!(self, Value::Unknown(_) | Value::Error(_))
    }

    /// The boolean payload, if this is a bool.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The list payload, if this is a list.
    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The runtime type descriptor of this value.
    pub fn type_of(&self) -> CelType {
        match self {
            Value::Null => types::null_type().clone(),
            Value::Bool(_) => types::bool_type().clone(),
            Value::Int(_) => types::int_type().clone(),
            Value::Uint(_) => types::uint_type().clone(),
            Value::Double(_) => types::double_type().clone(),
            Value::Str(_) => types::string_type().clone(),
            Value::Bytes(_) => types::bytes_type().clone(),
            Value::Duration(_) => types::duration_type().clone(),
            Value::Timestamp(_) => types::timestamp_type().clone(),
            Value::List(_) => types::list_type().clone(),
            Value::Map(_) => types::map_type().clone(),
            Value::Struct(s) => s.type_of().clone(),
            Value::Optional(_) => types::optional_type().clone(),
            // The type of a type is the singleton "type".
            Value::Type(_) => types::type_type().clone(),
            Value::Unknown(_) => types::unknown_type().clone(),
            Value::Error(_) => types::error_type().clone(),
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> String {
        self.type_of().name().to_string()
    }
}

// Equality and ordering.

impl Value {
    /// CEL equality between concrete values.
    ///
    /// Numerics compare by value across int/uint/double; values of genuinely
    /// unrelated types are unequal rather than erroring. Callers handle
    /// Error/Unknown operands before reaching this.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
            }
            (Value::Map(a), Value::Map(b)) => a.equal(b),
            (Value::Struct(a), Value::Struct(b)) => a.equal(b),
            (Value::Optional(a), Value::Optional(b)) => match (&**a, &**b) {
                (Some(x), Some(y)) => x.equal(y),
                (None, None) => true,
                _ => false,
            },
            // Cross-numeric equality: 1 == 1u == 1.0.
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Equal),
                _ => false,
            },
        }
    }

    /// Numeric view for cross-type comparisons, when this value is numeric.
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Uint(n) => Some(Number::Uint(*n)),
            Value::Double(d) => Some(Number::Double(*d)),
            _ => None,
        }
    }

    /// Ordering between comparable values.
    ///
    /// Numerics order across int/uint/double; strings and bytes order
    /// lexicographically; durations and timestamps chronologically. Anything
    /// else has no ordering.
    pub fn compare(&self, other: &Value) -> Result<Ordering, ErrorValue> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.as_str().cmp(b.as_str())),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a.as_slice().cmp(b.as_slice())),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Duration(a), Value::Duration(b)) => Ok(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                    error::no_such_overload(&format!(
                        "{} <=> {}",
                        self.type_name(),
                        other.type_name()
                    ))
                }),
                _ => Err(error::no_such_overload(&format!(
                    "{} <=> {}",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }
}

/// Numeric value unified across the three numeric types.
#[derive(Copy, Clone, Debug)]
enum Number {
    Int(i64),
    Uint(u64),
    Double(f64),
}

impl Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Uint(a), Number::Uint(b)) => Some(a.cmp(&b)),
            (Number::Double(a), Number::Double(b)) => a.partial_cmp(&b),
            (Number::Int(a), Number::Uint(b)) => {
                if a < 0 {
                    Some(Ordering::Less)
                } else {
                    Some(u64::try_from(a).ok()?.cmp(&b))
                }
            }
            (Number::Uint(a), Number::Int(b)) => {
                Number::Int(b).partial_cmp(&Number::Uint(a)).map(Ordering::reverse)
            }
            // int/uint against double compare in f64 space; lossy above
            // 2^53.
            #[expect(clippy::cast_precision_loss, reason = "numeric comparison is defined in f64 space")]
            (Number::Int(a), Number::Double(b)) => (a as f64).partial_cmp(&b),
            #[expect(clippy::cast_precision_loss, reason = "numeric comparison is defined in f64 space")]
            (Number::Uint(a), Number::Double(b)) => (a as f64).partial_cmp(&b),
            (Number::Double(_), Number::Int(_) | Number::Uint(_)) => {
                other.partial_cmp(self).map(Ordering::reverse)
            }
        }
    }
}

// Container operations (Sizer, Container, Indexer, Mapper, FieldTester,
// Iterable). Each returns an in-band error when the receiver lacks the trait.

impl Value {
    /// `size(x)`: element, entry, character, or byte count.
    pub fn size(&self) -> Value {
        match self {
            Value::Str(s) => int_from_len(s.chars().count()),
            Value::Bytes(b) => int_from_len(b.len()),
            Value::List(items) => int_from_len(items.len()),
            Value::Map(m) => int_from_len(m.len()),
            _ => Value::error(error::no_such_overload(&format!(
                "size({})",
                self.type_name()
            ))),
        }
    }

    /// Membership test: `elem in self`.
    pub fn contains(&self, elem: &Value) -> Value {
        match self {
            Value::List(items) => Value::Bool(items.iter().any(|v| v.equal(elem))),
            Value::Map(m) => Value::Bool(m.contains_key(elem)),
            _ => Value::error(error::no_such_overload(&format!(
                "in {}",
                self.type_name()
            ))),
        }
    }

    /// Indexer access: list by position, map by key, struct by field name.
    pub fn get(&self, key: &Value) -> Value {
        match self {
            Value::List(items) => {
                let idx = match key {
                    Value::Int(i) => *i,
                    Value::Uint(u) => match i64::try_from(*u) {
                        Ok(i) => i,
                        Err(_) => return Value::error(error::index_out_of_range(-1, items.len())),
                    },
                    _ => {
                        return Value::error(error::no_such_overload(&format!(
                            "list[{}]",
                            key.type_name()
                        )))
                    }
                };
                usize::try_from(idx)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or_else(|| Value::error(error::index_out_of_range(idx, items.len())))
            }
            Value::Map(m) => m.get(key),
            Value::Struct(s) => match key.as_str() {
                Some(field) => s.get(field),
                None => Value::error(error::no_such_overload(&format!(
                    "{}[{}]",
                    s.type_of().name(),
                    key.type_name()
                ))),
            },
            _ => Value::error(error::no_such_overload(&format!(
                "{}[{}]",
                self.type_name(),
                key.type_name()
            ))),
        }
    }

    /// Mapper access: lookup that reports absence as `None` instead of an
    /// error. Only maps and structs support it.
    pub fn find(&self, key: &Value) -> Option<Value> {
        match self {
            Value::Map(m) => m.find(key),
            Value::Struct(s) => key.as_str().and_then(|f| s.find(f)),
            _ => None,
        }
    }

    /// Field presence test (`has(x.f)`).
    pub fn is_set(&self, field: &str) -> Value {
        match self {
            Value::Map(m) => Value::Bool(m.contains_key(&Value::string(field))),
            Value::Struct(s) => Value::Bool(s.has(field)),
            _ => Value::error(error::no_such_overload(&format!(
                "has({}.{field})",
                self.type_name()
            ))),
        }
    }

    /// Element iterator, when this value is iterable (lists iterate
    /// elements, maps iterate keys).
    pub fn iter_value(&self) -> Option<ValueIterator> {
        match self {
            Value::List(items) => Some(ValueIterator::over_list(items.clone())),
            Value::Map(m) => Some(ValueIterator::over_map_keys(m)),
            _ => None,
        }
    }
}

/// Host length as an int value.
fn int_from_len(len: usize) -> Value {
    match i64::try_from(len) {
        Ok(n) => Value::Int(n),
        Err(_) => Value::error(error::internal("container length exceeds int range")),
    }
}

// Structural equality for tests and host code. This is Rust-level equality:
// no cross-numeric coercion (that is `equal`'s job).

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Unknown(a), Value::Unknown(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Uint(n) => write!(f, "{n}u"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::Bytes(b) => write!(f, "b{:?}", b.as_slice()),
            Value::Duration(d) => write!(f, "{}", time::format_duration(*d)),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => write!(f, "{m}"),
            Value::Struct(s) => write!(f, "{s}"),
            Value::Optional(o) => match &**o {
                Some(v) => write!(f, "optional.of({v})"),
                None => write!(f, "optional.none()"),
            },
            Value::Type(t) => write!(f, "{t}"),
            Value::Unknown(u) => write!(f, "{u}"),
            Value::Error(e) => write!(f, "error: {e}"),
        }
    }
}

// Host-value construction.

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(u64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::string(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Duration(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => Value::optional_of(inner.into()),
            None => Value::optional_none(),
        }
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Value::error(err)
    }
}

impl From<UnknownSet> for Value {
    fn from(u: UnknownSet) -> Self {
        Value::Unknown(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cross_numeric_equality() {
        assert!(Value::Int(1).equal(&Value::Uint(1)));
        assert!(Value::Int(1).equal(&Value::Double(1.0)));
        assert!(Value::Uint(2).equal(&Value::Double(2.0)));
        assert!(!Value::Int(-1).equal(&Value::Uint(u64::MAX)));
    }

    #[test]
    fn unrelated_types_unequal_not_error() {
        assert!(!Value::Int(1).equal(&Value::string("1")));
        assert!(!Value::Bool(true).equal(&Value::Int(1)));
        assert!(!Value::Null.equal(&Value::Bool(false)));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert!(!Value::Double(f64::NAN).equal(&Value::Double(f64::NAN)));
    }

    #[test]
    fn deep_list_equality() {
        let a = Value::list(vec![Value::Int(1), Value::string("x")]);
        let b = Value::list(vec![Value::Int(1), Value::string("x")]);
        assert!(a.equal(&b));
        assert!(!a.equal(&Value::list(vec![Value::Int(1)])));
    }

    #[test]
    fn cross_numeric_ordering() {
        assert_eq!(
            Value::Int(-1).compare(&Value::Uint(0)),
            Ok(Ordering::Less)
        );
        assert_eq!(
            Value::Double(2.5).compare(&Value::Int(2)),
            Ok(Ordering::Greater)
        );
        assert!(Value::string("a").compare(&Value::Int(1)).is_err());
    }

    #[test]
    fn size_of_containers() {
        assert_eq!(Value::string("héllo").size(), Value::Int(5));
        assert_eq!(Value::bytes(vec![1, 2]).size(), Value::Int(2));
        assert_eq!(Value::list(vec![Value::Null]).size(), Value::Int(1));
        assert!(Value::Int(3).size().is_error());
    }

    #[test]
    fn list_indexing_bounds() {
        let l = Value::list(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(l.get(&Value::Int(1)), Value::Int(20));
        assert!(l.get(&Value::Int(-1)).is_error());
        assert!(l.get(&Value::Int(2)).is_error());
    }

    #[test]
    fn membership() {
        let l = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(l.contains(&Value::Int(2)), Value::Bool(true));
        // cross-numeric membership
        assert_eq!(l.contains(&Value::Uint(1)), Value::Bool(true));
        assert_eq!(l.contains(&Value::Int(9)), Value::Bool(false));
    }

    #[test]
    fn type_of_type_is_type() {
        let t = Value::Type(crate::types::uint_type().clone());
        assert_eq!(t.type_of().name(), "type");
    }

    #[test]
    fn optional_factories() {
        assert_eq!(
            Value::optional_of(Value::Int(1)),
            Value::from(Some(Value::Int(1)))
        );
        assert_eq!(Value::optional_none(), Value::from(None::<Value>));
    }
}
