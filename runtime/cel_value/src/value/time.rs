//! Duration parsing/formatting and the Receiver dispatch for time values.
//!
//! Timestamps and durations answer method-style calls (`ts.getFullYear()`)
//! through the Receiver trait instead of registered implementations: the
//! dispatcher declares the overloads with a Receiver operand trait and no
//! implementation slot, and the call node routes them here. Optionals answer
//! `hasValue` / `value` / `orValue` the same way.

use chrono::{Datelike, TimeDelta, Timelike, Utc};

use crate::error;
use crate::value::Value;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Parse a CEL duration literal: decimal numbers with `h`, `m`, `s`, `ms`,
/// `us`, `ns` units, concatenated (`"1h2m3.5s"`), with an optional leading
/// sign.
pub fn parse_duration(text: &str) -> Result<TimeDelta, crate::error::ErrorValue> {
    let bad = || error::type_conversion(&format!("string {text:?}"), "duration");
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body.is_empty() {
        return Err(bad());
    }

    let mut total_nanos: i128 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(bad)?;
        if digits_end == 0 {
            return Err(bad());
        }
        let number: f64 = rest[..digits_end].parse().map_err(|_| bad())?;
        rest = &rest[digits_end..];
        let (unit_nanos, consumed) = if let Some(r) = rest.strip_prefix("ms") {
            (1_000_000i64, r)
        } else if let Some(r) = rest.strip_prefix("us") {
            (1_000i64, r)
        } else if let Some(r) = rest.strip_prefix("ns") {
            (1i64, r)
        } else if let Some(r) = rest.strip_prefix('h') {
            (3_600 * NANOS_PER_SEC, r)
        } else if let Some(r) = rest.strip_prefix('m') {
            (60 * NANOS_PER_SEC, r)
        } else if let Some(r) = rest.strip_prefix('s') {
            (NANOS_PER_SEC, r)
        } else {
            return Err(bad());
        };
        rest = consumed;
        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            reason = "duration components are far below f64 integer precision"
        )]
        {
            total_nanos += (number * unit_nanos as f64).round() as i128;
        }
    }

    if negative {
        total_nanos = -total_nanos;
    }
    let nanos = i64::try_from(total_nanos).map_err(|_| bad())?;
    Ok(TimeDelta::nanoseconds(nanos))
}

/// Format a duration as decimal seconds with an `s` suffix (`"3600s"`,
/// `"-1.5s"`).
pub fn format_duration(d: TimeDelta) -> String {
    let nanos = d.num_nanoseconds().unwrap_or(i64::MAX);
    let secs = nanos / NANOS_PER_SEC;
    let frac = (nanos % NANOS_PER_SEC).unsigned_abs();
    if frac == 0 {
        format!("{secs}s")
    } else {
        let sign = if nanos < 0 && secs == 0 { "-" } else { "" };
        let fractional = format!("{frac:09}");
        let fractional = fractional.trim_end_matches('0');
        format!("{sign}{secs}.{fractional}s")
    }
}

impl Value {
    /// Receiver dispatch: method-style calls answered by the value itself.
    ///
    /// Returns *NoSuchOverload* when the function is not one this value
    /// answers, so callers can surface the failure uniformly.
    pub fn receive(&self, function: &str, _overload: &str, args: &[Value]) -> Value {
        match self {
            Value::Timestamp(_) | Value::Duration(_) if args.is_empty() => {
                self.receive_time_getter(function)
            }
            Value::Optional(inner) => match (function, args) {
                ("hasValue", []) => Value::Bool(inner.is_some()),
                ("value", []) => match &**inner {
                    Some(v) => v.clone(),
                    None => Value::error(error::no_such_overload("value() on optional.none")),
                },
                ("orValue", [fallback]) => match &**inner {
                    Some(v) => v.clone(),
                    None => fallback.clone(),
                },
                _ => self.no_such_receiver(function),
            },
            _ => self.no_such_receiver(function),
        }
    }

    #[cold]
    fn no_such_receiver(&self, function: &str) -> Value {
        Value::error(error::no_such_overload(&format!(
            "{}.{function}",
            self.type_name()
        )))
    }

    /// Calendar getters (UTC) on timestamps and unit getters on durations.
    fn receive_time_getter(&self, function: &str) -> Value {
        match self {
            Value::Timestamp(t) => {
                let utc = t.with_timezone(&Utc);
                let result = match function {
                    "getFullYear" => i64::from(utc.year()),
                    // getMonth, getDayOfMonth, getDayOfYear, getDayOfWeek are
                    // zero-based; getDate is the one-based day of month.
                    "getMonth" => i64::from(utc.month0()),
                    "getDayOfMonth" => i64::from(utc.day0()),
                    "getDate" => i64::from(utc.day()),
                    "getDayOfWeek" => i64::from(utc.weekday().num_days_from_sunday()),
                    "getDayOfYear" => i64::from(utc.ordinal0()),
                    "getHours" => i64::from(utc.hour()),
                    "getMinutes" => i64::from(utc.minute()),
                    "getSeconds" => i64::from(utc.second()),
                    "getMilliseconds" => i64::from(utc.timestamp_subsec_millis()),
                    _ => return self.no_such_receiver(function),
                };
                Value::Int(result)
            }
            Value::Duration(d) => {
                let result = match function {
                    "getHours" => d.num_hours(),
                    "getMinutes" => d.num_minutes(),
                    "getSeconds" => d.num_seconds(),
                    "getMilliseconds" => d.num_milliseconds(),
                    _ => return self.no_such_receiver(function),
                };
                Value::Int(result)
            }
            _ => self.no_such_receiver(function),
        }
    }
}
