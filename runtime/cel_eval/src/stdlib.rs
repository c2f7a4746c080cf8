//! The standard overload catalog.
//!
//! Everything the runtime ships out of the box: arithmetic with overflow
//! checks, comparisons, logical negation, the non-strict
//! `@not_strictly_false`, membership, `size`, the string and bytes surface,
//! regex matching, type conversions, `type(x)`, and the optional-value
//! constructors. Timestamp/duration getters and the optional receiver
//! methods are not registered here; they route through the Receiver trait on
//! the value itself.

use std::cmp::Ordering;

use regex::Regex;

use cel_value::error as err;
use cel_value::types;
use cel_value::{CelType, Traits, Value};

use crate::dispatcher::{Dispatcher, Overload};
use crate::operators;

/// The `dyn` parameter type: matches any runtime type during dispatch.
fn dyn_type() -> CelType {
    CelType::new("dyn", Traits::empty())
}

/// A dispatcher preloaded with the standard overloads.
pub fn standard_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    if let Err(e) = dispatcher.add(standard_overloads()) {
        unreachable!("standard overload ids are unique: {e}");
    }
    dispatcher
}

/// The standard overloads, ready to register.
pub fn standard_overloads() -> Vec<Overload> {
    let mut overloads = Vec::new();
    overloads.extend(arithmetic());
    overloads.extend(comparisons());
    overloads.extend(logic());
    overloads.extend(membership());
    overloads.extend(sizes());
    overloads.extend(strings());
    overloads.extend(conversions());
    overloads.extend(optionals());
    overloads
}

/// Typed binary overload delegating to a value-model operation.
fn binary_op(
    id: &str,
    function: &str,
    lhs: &CelType,
    rhs: &CelType,
    f: fn(&Value, &Value) -> Value,
) -> Overload {
    Overload::binary(id, function, move |l, r| f(&l, &r))
        .with_arg_types(vec![lhs.clone(), rhs.clone()])
}

fn arithmetic() -> Vec<Overload> {
    let int = types::int_type();
    let uint = types::uint_type();
    let double = types::double_type();
    let string = types::string_type();
    let bytes = types::bytes_type();
    let list = types::list_type();
    let ts = types::timestamp_type();
    let dur = types::duration_type();

    let mut ops = vec![
        binary_op("add_int64", operators::ADD, int, int, Value::add),
        binary_op("add_uint64", operators::ADD, uint, uint, Value::add),
        binary_op("add_double", operators::ADD, double, double, Value::add),
        binary_op("add_string", operators::ADD, string, string, Value::add),
        binary_op("add_bytes", operators::ADD, bytes, bytes, Value::add),
        binary_op("add_list", operators::ADD, list, list, Value::add),
        binary_op("add_timestamp_duration", operators::ADD, ts, dur, Value::add),
        binary_op("add_duration_timestamp", operators::ADD, dur, ts, Value::add),
        binary_op("add_duration_duration", operators::ADD, dur, dur, Value::add),
        binary_op("subtract_int64", operators::SUBTRACT, int, int, Value::subtract),
        binary_op("subtract_uint64", operators::SUBTRACT, uint, uint, Value::subtract),
        binary_op("subtract_double", operators::SUBTRACT, double, double, Value::subtract),
        binary_op("subtract_timestamp_timestamp", operators::SUBTRACT, ts, ts, Value::subtract),
        binary_op("subtract_timestamp_duration", operators::SUBTRACT, ts, dur, Value::subtract),
        binary_op("subtract_duration_duration", operators::SUBTRACT, dur, dur, Value::subtract),
        binary_op("multiply_int64", operators::MULTIPLY, int, int, Value::multiply),
        binary_op("multiply_uint64", operators::MULTIPLY, uint, uint, Value::multiply),
        binary_op("multiply_double", operators::MULTIPLY, double, double, Value::multiply),
        binary_op("divide_int64", operators::DIVIDE, int, int, Value::divide),
        binary_op("divide_uint64", operators::DIVIDE, uint, uint, Value::divide),
        binary_op("divide_double", operators::DIVIDE, double, double, Value::divide),
        binary_op("modulo_int64", operators::MODULO, int, int, Value::modulo),
        binary_op("modulo_uint64", operators::MODULO, uint, uint, Value::modulo),
    ];
    for (id, ty) in [
        ("negate_int64", int),
        ("negate_double", double),
        ("negate_duration", dur),
    ] {
        ops.push(
            Overload::unary(id, operators::NEGATE, |v| v.negate())
                .with_arg_types(vec![ty.clone()]),
        );
    }
    ops
}

/// Ordering overload over any pair of comparable values.
fn compare_op(id: &str, function: &str, pred: fn(Ordering) -> bool) -> Overload {
    Overload::binary(id, function, move |l, r| match l.compare(&r) {
        Ok(ordering) => Value::Bool(pred(ordering)),
        Err(e) => Value::error(e),
    })
    .with_operand_trait(Traits::COMPARER)
}

fn comparisons() -> Vec<Overload> {
    vec![
        compare_op("less", operators::LESS, Ordering::is_lt),
        compare_op("less_equals", operators::LESS_EQUALS, Ordering::is_le),
        compare_op("greater", operators::GREATER, Ordering::is_gt),
        compare_op("greater_equals", operators::GREATER_EQUALS, Ordering::is_ge),
    ]
}

fn logic() -> Vec<Overload> {
    vec![
        Overload::unary("logical_not", operators::LOGICAL_NOT, |v| match v.as_bool() {
            Some(b) => Value::Bool(!b),
            None => Value::error(err::no_such_overload(&format!("!{}", v.type_name()))),
        })
        .with_arg_types(vec![types::bool_type().clone()]),
        // True unless the argument is concretely false; errors and unknowns
        // count as true so comprehension conditions keep iterating.
        Overload::unary("not_strictly_false", operators::NOT_STRICTLY_FALSE, |v| {
            Value::Bool(v.as_bool() != Some(false))
        })
        .non_strict(),
    ]
}

fn membership() -> Vec<Overload> {
    vec![
        binary_op("in_list", operators::IN, &dyn_type(), types::list_type(), |e, l| {
            l.contains(e)
        }),
        binary_op("in_map", operators::IN, &dyn_type(), types::map_type(), |e, m| {
            m.contains(e)
        }),
    ]
}

fn sizes() -> Vec<Overload> {
    [
        ("size_string", types::string_type()),
        ("size_bytes", types::bytes_type()),
        ("size_list", types::list_type()),
        ("size_map", types::map_type()),
    ]
    .into_iter()
    .map(|(id, ty)| {
        Overload::unary(id, "size", |v| v.size())
            .with_operand_trait(Traits::SIZER)
            .with_arg_types(vec![ty.clone()])
    })
    .collect()
}

fn strings() -> Vec<Overload> {
    let string = types::string_type();
    let string_pair = vec![string.clone(), string.clone()];
    vec![
        Overload::binary("contains_string", "contains", |s, sub| {
            string_predicate(&s, &sub, |a, b| a.contains(b))
        })
        .with_arg_types(string_pair.clone()),
        Overload::binary("starts_with_string", "startsWith", |s, prefix| {
            string_predicate(&s, &prefix, |a, b| a.starts_with(b))
        })
        .with_arg_types(string_pair.clone()),
        Overload::binary("ends_with_string", "endsWith", |s, suffix| {
            string_predicate(&s, &suffix, |a, b| a.ends_with(b))
        })
        .with_arg_types(string_pair.clone()),
        Overload::binary("matches_string", "matches", |s, pattern| {
            match (s.as_str(), pattern.as_str()) {
                (Some(text), Some(pattern)) => match Regex::new(pattern) {
                    Ok(re) => Value::Bool(re.is_match(text)),
                    Err(e) => Value::error(err::regex_error(&e.to_string())),
                },
                _ => Value::error(err::no_such_overload("matches")),
            }
        })
        .with_arg_types(string_pair),
    ]
}

fn string_predicate(s: &Value, other: &Value, pred: fn(&str, &str) -> bool) -> Value {
    match (s.as_str(), other.as_str()) {
        (Some(a), Some(b)) => Value::Bool(pred(a, b)),
        _ => Value::error(err::no_such_overload("string predicate")),
    }
}

fn conversions() -> Vec<Overload> {
    let mut ops: Vec<Overload> = [
        ("int_conversion", "int", types::int_type()),
        ("uint_conversion", "uint", types::uint_type()),
        ("double_conversion", "double", types::double_type()),
        ("string_conversion", "string", types::string_type()),
        ("bytes_conversion", "bytes", types::bytes_type()),
        ("bool_conversion", "bool", types::bool_type()),
        ("timestamp_conversion", "timestamp", types::timestamp_type()),
        ("duration_conversion", "duration", types::duration_type()),
    ]
    .into_iter()
    .map(|(id, function, target)| {
        Overload::unary(id, function, move |v| v.convert_to_type(target))
    })
    .collect();
    ops.push(Overload::unary("dyn_conversion", "dyn", |v| v));
    ops.push(Overload::unary("type_of", "type", |v| {
        Value::Type(v.type_of())
    }));
    ops
}

fn optionals() -> Vec<Overload> {
    vec![
        Overload::unary("optional_of", "optional.of", Value::optional_of),
        Overload::unary(
            "optional_of_non_zero_value",
            "optional.ofNonZeroValue",
            |v| {
                if is_zero_value(&v) {
                    Value::optional_none()
                } else {
                    Value::optional_of(v)
                }
            },
        ),
        Overload::zero("optional_none", "optional.none", |_| Value::optional_none()),
        // Delegates to the optional's Receiver implementation.
        Overload::binary("optional_or_value", "orValue", |opt, fallback| {
            opt.receive("orValue", "optional_or_value", std::slice::from_ref(&fallback))
        })
        .with_operand_trait(Traits::RECEIVER),
    ]
}

/// The proto-style zero value of each type.
fn is_zero_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(n) => *n == 0,
        Value::Uint(n) => *n == 0,
        Value::Double(d) => *d == 0.0,
        Value::Str(s) => s.is_empty(),
        Value::Bytes(b) => b.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(m) => m.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d() -> Dispatcher {
        standard_dispatcher()
    }

    #[test]
    fn catalog_registers_cleanly() {
        let dispatcher = d();
        assert!(dispatcher.len() > 40);
        assert!(dispatcher.find_overload("add_int64").is_some());
        assert!(dispatcher.find_overload("not_strictly_false").is_some());
    }

    #[test]
    fn typed_arithmetic_dispatch() {
        let dispatcher = d();
        assert_eq!(
            dispatcher.dispatch(operators::ADD, &[Value::Int(2), Value::Int(3)]),
            Value::Int(5)
        );
        assert_eq!(
            dispatcher.dispatch(
                operators::ADD,
                &[Value::string("a"), Value::string("b")]
            ),
            Value::string("ab")
        );
        // Mixed numeric operands match no arithmetic overload.
        assert!(dispatcher
            .dispatch(operators::ADD, &[Value::Int(1), Value::Uint(1)])
            .is_error());
    }

    #[test]
    fn comparisons_cross_numeric() {
        let dispatcher = d();
        assert_eq!(
            dispatcher.dispatch(operators::LESS, &[Value::Int(1), Value::Double(1.5)]),
            Value::Bool(true)
        );
        assert_eq!(
            dispatcher.dispatch(
                operators::GREATER_EQUALS,
                &[Value::Uint(2), Value::Int(2)]
            ),
            Value::Bool(true)
        );
    }

    #[test]
    fn not_strictly_false_absorbs_errors() {
        let dispatcher = d();
        let error = Value::error(err::divide_by_zero());
        assert_eq!(
            dispatcher.dispatch(operators::NOT_STRICTLY_FALSE, &[error]),
            Value::Bool(true)
        );
        assert_eq!(
            dispatcher.dispatch(operators::NOT_STRICTLY_FALSE, &[Value::Bool(false)]),
            Value::Bool(false)
        );
        assert_eq!(
            dispatcher.dispatch(operators::NOT_STRICTLY_FALSE, &[Value::unknown(4)]),
            Value::Bool(true)
        );
    }

    #[test]
    fn membership_picks_container_overload() {
        let dispatcher = d();
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            dispatcher.dispatch(operators::IN, &[Value::Int(2), list]),
            Value::Bool(true)
        );
        let map = Value::map([(cel_value::MapKey::Int(1), Value::Null)]);
        assert_eq!(
            dispatcher.dispatch(operators::IN, &[Value::Int(1), map]),
            Value::Bool(true)
        );
    }

    #[test]
    fn string_functions() {
        let dispatcher = d();
        assert_eq!(
            dispatcher.dispatch("contains", &[Value::string("hello"), Value::string("ell")]),
            Value::Bool(true)
        );
        assert_eq!(
            dispatcher.dispatch(
                "startsWith",
                &[Value::string("hello"), Value::string("he")]
            ),
            Value::Bool(true)
        );
        assert_eq!(
            dispatcher.dispatch(
                "matches",
                &[Value::string("cel-runtime"), Value::string(r"^cel-\w+$")]
            ),
            Value::Bool(true)
        );
        let bad = dispatcher.dispatch(
            "matches",
            &[Value::string("x"), Value::string("((")],
        );
        match bad {
            Value::Error(e) => assert_eq!(e.kind, cel_value::ErrorKind::Regex),
            other => panic!("expected regex error, got {other:?}"),
        }
    }

    #[test]
    fn conversions_and_type_of() {
        let dispatcher = d();
        assert_eq!(
            dispatcher.dispatch("int", &[Value::string("42")]),
            Value::Int(42)
        );
        assert_eq!(
            dispatcher.dispatch("type", &[Value::Uint(1)]),
            Value::Type(types::uint_type().clone())
        );
        assert_eq!(dispatcher.dispatch("dyn", &[Value::Int(9)]), Value::Int(9));
    }

    #[test]
    fn optional_constructors() {
        let dispatcher = d();
        assert_eq!(
            dispatcher.dispatch("optional.of", &[Value::Int(0)]),
            Value::optional_of(Value::Int(0))
        );
        assert_eq!(
            dispatcher.dispatch("optional.ofNonZeroValue", &[Value::Int(0)]),
            Value::optional_none()
        );
        assert_eq!(
            dispatcher.dispatch("optional.ofNonZeroValue", &[Value::string("x")]),
            Value::optional_of(Value::string("x"))
        );
        assert_eq!(
            dispatcher.dispatch("optional.none", &[]),
            Value::optional_none()
        );
    }
}
