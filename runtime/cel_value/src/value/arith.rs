//! Arithmetic on values.
//!
//! All integer arithmetic is checked: signed and unsigned overflow, division
//! by zero, and modulo by zero come back as error values, never wrapped
//! results. Doubles follow IEEE-754 (division by zero yields an infinity).
//! Duration and timestamp arithmetic is checked against the representable
//! range.

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta};

use crate::error;
use crate::value::Value;

/// Timestamps outside year 1..=9999 are out of the supported range.
fn checked_timestamp(t: DateTime<FixedOffset>) -> Value {
    if (1..=9999).contains(&t.year()) {
        Value::Timestamp(t)
    } else {
        Value::error(error::overflow("timestamp arithmetic"))
    }
}

#[cold]
fn bad_operands(op: &str, lhs: &Value, rhs: &Value) -> Value {
    Value::error(error::no_such_overload(&format!(
        "{} {op} {}",
        lhs.type_name(),
        rhs.type_name()
    )))
}

impl Value {
    /// Addition / concatenation (`_+_`).
    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map_or_else(|| Value::error(error::overflow("addition")), Value::Int),
            (Value::Uint(a), Value::Uint(b)) => a
                .checked_add(*b)
                .map_or_else(|| Value::error(error::overflow("addition")), Value::Uint),
            (Value::Double(a), Value::Double(b)) => Value::Double(a + b),
            (Value::Str(a), Value::Str(b)) => {
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(b);
                Value::string(out)
            }
            (Value::Bytes(a), Value::Bytes(b)) => {
                let mut out = Vec::with_capacity(a.len() + b.len());
                out.extend_from_slice(a);
                out.extend_from_slice(b);
                Value::bytes(out)
            }
            (Value::List(a), Value::List(b)) => {
                let mut out = Vec::with_capacity(a.len() + b.len());
                out.extend(a.iter().cloned());
                out.extend(b.iter().cloned());
                Value::list(out)
            }
            (Value::Duration(a), Value::Duration(b)) => a.checked_add(b).map_or_else(
                || Value::error(error::overflow("duration addition")),
                Value::Duration,
            ),
            (Value::Timestamp(t), Value::Duration(d))
            | (Value::Duration(d), Value::Timestamp(t)) => t.checked_add_signed(*d).map_or_else(
                || Value::error(error::overflow("timestamp addition")),
                checked_timestamp,
            ),
            _ => bad_operands("+", self, other),
        }
    }

    /// Subtraction (`_-_`).
    pub fn subtract(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_sub(*b)
                .map_or_else(|| Value::error(error::overflow("subtraction")), Value::Int),
            (Value::Uint(a), Value::Uint(b)) => a
                .checked_sub(*b)
                .map_or_else(|| Value::error(error::overflow("subtraction")), Value::Uint),
            (Value::Double(a), Value::Double(b)) => Value::Double(a - b),
            (Value::Duration(a), Value::Duration(b)) => a.checked_sub(b).map_or_else(
                || Value::error(error::overflow("duration subtraction")),
                Value::Duration,
            ),
            (Value::Timestamp(t), Value::Duration(d)) => t.checked_sub_signed(*d).map_or_else(
                || Value::error(error::overflow("timestamp subtraction")),
                checked_timestamp,
            ),
            (Value::Timestamp(a), Value::Timestamp(b)) => {
                Value::Duration(a.signed_duration_since(*b))
            }
            _ => bad_operands("-", self, other),
        }
    }

    /// Unary negation (`-_`).
    pub fn negate(&self) -> Value {
        match self {
            Value::Int(n) => n
                .checked_neg()
                .map_or_else(|| Value::error(error::overflow("negation")), Value::Int),
            Value::Double(d) => Value::Double(-d),
            Value::Duration(d) => TimeDelta::zero().checked_sub(d).map_or_else(
                || Value::error(error::overflow("duration negation")),
                Value::Duration,
            ),
            _ => Value::error(error::no_such_overload(&format!(
                "-{}",
                self.type_name()
            ))),
        }
    }

    /// Multiplication (`_*_`).
    pub fn multiply(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map_or_else(
                || Value::error(error::overflow("multiplication")),
                Value::Int,
            ),
            (Value::Uint(a), Value::Uint(b)) => a.checked_mul(*b).map_or_else(
                || Value::error(error::overflow("multiplication")),
                Value::Uint,
            ),
            (Value::Double(a), Value::Double(b)) => Value::Double(a * b),
            _ => bad_operands("*", self, other),
        }
    }

    /// Division (`_/_`). Integer division by zero errors; double division
    /// follows IEEE-754.
    pub fn divide(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Value::error(error::divide_by_zero())
                } else {
                    a.checked_div(*b)
                        .map_or_else(|| Value::error(error::overflow("division")), Value::Int)
                }
            }
            (Value::Uint(a), Value::Uint(b)) => {
                if *b == 0 {
                    Value::error(error::divide_by_zero())
                } else {
                    Value::Uint(a / b)
                }
            }
            (Value::Double(a), Value::Double(b)) => Value::Double(a / b),
            _ => bad_operands("/", self, other),
        }
    }

    /// Modulo (`_%_`). Only defined for integers.
    pub fn modulo(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Value::error(error::modulo_by_zero())
                } else {
                    a.checked_rem(*b)
                        .map_or_else(|| Value::error(error::overflow("remainder")), Value::Int)
                }
            }
            (Value::Uint(a), Value::Uint(b)) => {
                if *b == 0 {
                    Value::error(error::modulo_by_zero())
                } else {
                    Value::Uint(a % b)
                }
            }
            _ => bad_operands("%", self, other),
        }
    }
}
