//! Type conversions.
//!
//! `convert_to_type` backs the conversion overloads (`int(x)`, `string(x)`,
//! …): it is total over concrete values, returning a *TypeConversion* error
//! value when the operand cannot be represented in the target type. The
//! `TryFrom` implementations are the host-facing direction, turning CEL
//! values back into native Rust values.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{self, ErrorValue};
use crate::types::CelType;
use crate::value::{time, Value};

/// Largest f64 below `i64::MAX + 1` / `u64::MAX + 1`, for range checks that
/// avoid rounding the limit itself into range.
const MAX_INT_AS_DOUBLE: f64 = 9_223_372_036_854_775_808.0;
const MAX_UINT_AS_DOUBLE: f64 = 18_446_744_073_709_551_616.0;

impl Value {
    /// Convert to the target type, per the standard conversion overloads.
    ///
    /// Identity conversions succeed trivially; errors and unknowns pass
    /// through unchanged.
    pub fn convert_to_type(&self, target: &CelType) -> Value {
        if self.is_unknown_or_error() {
            return self.clone();
        }
        match target.name() {
            "int" => self.to_int(),
            "uint" => self.to_uint(),
            "double" => self.to_double(),
            "string" => self.to_string_value(),
            "bytes" => self.to_bytes_value(),
            "bool" => self.to_bool_value(),
            "timestamp" => self.to_timestamp(),
            "duration" => self.to_duration(),
            "dyn" => self.clone(),
            "type" => Value::Type(self.type_of()),
            _ => {
                if self.type_of() == *target {
                    self.clone()
                } else {
                    self.conversion_error(target.name())
                }
            }
        }
    }

    #[cold]
    fn conversion_error(&self, to: &str) -> Value {
        Value::error(error::type_conversion(&self.type_name(), to))
    }

    fn to_int(&self) -> Value {
        match self {
            Value::Int(_) => self.clone(),
            Value::Uint(n) => i64::try_from(*n)
                .map_or_else(|_| self.conversion_error("int"), Value::Int),
            Value::Double(d) => {
                if d.is_nan() || *d >= MAX_INT_AS_DOUBLE || *d < -MAX_INT_AS_DOUBLE {
                    self.conversion_error("int")
                } else {
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "range-checked above; conversion truncates toward zero"
                    )]
                    let truncated = d.trunc() as i64;
                    Value::Int(truncated)
                }
            }
            Value::Str(s) => s
                .parse::<i64>()
                .map_or_else(|_| self.conversion_error("int"), Value::Int),
            Value::Timestamp(t) => Value::Int(t.timestamp()),
            _ => self.conversion_error("int"),
        }
    }

    fn to_uint(&self) -> Value {
        match self {
            Value::Uint(_) => self.clone(),
            Value::Int(n) => u64::try_from(*n)
                .map_or_else(|_| self.conversion_error("uint"), Value::Uint),
            Value::Double(d) => {
                if d.is_nan() || *d >= MAX_UINT_AS_DOUBLE || *d < 0.0 {
                    self.conversion_error("uint")
                } else {
                    #[expect(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss,
                        reason = "range-checked above; conversion truncates toward zero"
                    )]
                    let truncated = d.trunc() as u64;
                    Value::Uint(truncated)
                }
            }
            Value::Str(s) => s
                .parse::<u64>()
                .map_or_else(|_| self.conversion_error("uint"), Value::Uint),
            _ => self.conversion_error("uint"),
        }
    }

    fn to_double(&self) -> Value {
        match self {
            Value::Double(_) => self.clone(),
            #[expect(clippy::cast_precision_loss, reason = "int-to-double conversion is defined as the nearest double")]
            Value::Int(n) => Value::Double(*n as f64),
            #[expect(clippy::cast_precision_loss, reason = "uint-to-double conversion is defined as the nearest double")]
            Value::Uint(n) => Value::Double(*n as f64),
            Value::Str(s) => s
                .parse::<f64>()
                .map_or_else(|_| self.conversion_error("double"), Value::Double),
            _ => self.conversion_error("double"),
        }
    }

    fn to_string_value(&self) -> Value {
        match self {
            Value::Str(_) => self.clone(),
            Value::Int(n) => Value::string(n.to_string()),
            Value::Uint(n) => Value::string(n.to_string()),
            Value::Double(d) => Value::string(d.to_string()),
            Value::Bool(b) => Value::string(b.to_string()),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => Value::string(s),
                Err(_) => self.conversion_error("string"),
            },
            Value::Timestamp(t) => Value::string(t.to_rfc3339()),
            Value::Duration(d) => Value::string(time::format_duration(*d)),
            _ => self.conversion_error("string"),
        }
    }

    fn to_bytes_value(&self) -> Value {
        match self {
            Value::Bytes(_) => self.clone(),
            Value::Str(s) => Value::bytes(s.as_bytes().to_vec()),
            _ => self.conversion_error("bytes"),
        }
    }

    fn to_bool_value(&self) -> Value {
        match self {
            Value::Bool(_) => self.clone(),
            Value::Str(s) => match s.as_str() {
                "true" | "True" | "TRUE" | "t" | "1" => Value::Bool(true),
                "false" | "False" | "FALSE" | "f" | "0" => Value::Bool(false),
                _ => self.conversion_error("bool"),
            },
            _ => self.conversion_error("bool"),
        }
    }

    fn to_timestamp(&self) -> Value {
        match self {
            Value::Timestamp(_) => self.clone(),
            Value::Str(s) => DateTime::parse_from_rfc3339(s)
                .map_or_else(|_| self.conversion_error("timestamp"), Value::Timestamp),
            Value::Int(n) => match Utc.timestamp_opt(*n, 0) {
                chrono::LocalResult::Single(t) => Value::Timestamp(t.fixed_offset()),
                _ => self.conversion_error("timestamp"),
            },
            _ => self.conversion_error("timestamp"),
        }
    }

    fn to_duration(&self) -> Value {
        match self {
            Value::Duration(_) => self.clone(),
            Value::Str(s) => match time::parse_duration(s) {
                Ok(d) => Value::Duration(d),
                Err(e) => Value::error(e),
            },
            _ => self.conversion_error("duration"),
        }
    }
}

// Host-facing conversions: CEL value → native Rust value.

macro_rules! try_from_value {
    ($target:ty, $pattern:pat => $extract:expr, $expected:literal) => {
        impl TryFrom<&Value> for $target {
            type Error = ErrorValue;

            fn try_from(value: &Value) -> Result<Self, ErrorValue> {
                match value {
                    $pattern => Ok($extract),
                    other => Err(error::type_conversion(&other.type_name(), $expected)),
                }
            }
        }
    };
}

try_from_value!(i64, Value::Int(n) => *n, "int");
try_from_value!(u64, Value::Uint(n) => *n, "uint");
try_from_value!(f64, Value::Double(d) => *d, "double");
try_from_value!(bool, Value::Bool(b) => *b, "bool");
try_from_value!(String, Value::Str(s) => s.as_str().to_string(), "string");
try_from_value!(Vec<u8>, Value::Bytes(b) => b.as_slice().to_vec(), "bytes");
