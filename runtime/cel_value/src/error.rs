//! Evaluation errors.
//!
//! Errors are first-class values: an [`ErrorValue`] travels inside
//! [`Value::Error`](crate::Value::Error) and propagates through strict
//! operators until a non-strict site absorbs it or it reaches the caller.
//! Panics are never used for user-visible failures.

use std::fmt;

/// Classification of an evaluation failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoSuchVariable,
    NoSuchField,
    NoSuchKey,
    IndexOutOfRange,
    NoSuchOverload,
    AmbiguousOverload,
    DuplicateOverload,
    InvalidSignature,
    TypeConversion,
    DivideByZero,
    Overflow,
    Regex,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NoSuchVariable => "no such variable",
            ErrorKind::NoSuchField => "no such field",
            ErrorKind::NoSuchKey => "no such key",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::NoSuchOverload => "no such overload",
            ErrorKind::AmbiguousOverload => "ambiguous overload",
            ErrorKind::DuplicateOverload => "duplicate overload",
            ErrorKind::InvalidSignature => "invalid signature",
            ErrorKind::TypeConversion => "type conversion error",
            ErrorKind::DivideByZero => "division by zero",
            ErrorKind::Overflow => "integer overflow",
            ErrorKind::Regex => "invalid regular expression",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// An evaluation failure carried as a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Short human-readable message.
    pub message: String,
    /// Id of the expression node the error originated at, when known.
    /// The caller maps it to a source offset through `SourceInfo`.
    pub id: Option<i64>,
}

impl ErrorValue {
    /// Create an error with no originating node.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorValue {
            kind,
            message: message.into(),
            id: None,
        }
    }

    /// Attach the originating node id, keeping an already-recorded one.
    ///
    /// The earliest (innermost) node to tag an error wins; outer nodes that
    /// re-propagate it must not overwrite the origin.
    #[must_use]
    pub fn at(mut self, id: i64) -> Self {
        if self.id.is_none() {
            self.id = Some(id);
        }
        self
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The message already reads as a complete diagnostic; the kind is
        // structured metadata for programmatic matching.
        f.write_str(&self.message)
    }
}

// Factory functions. All are cold paths: evaluation that touches them has
// already failed.

/// Name could not be resolved in the activation or the type provider.
#[cold]
pub fn no_such_variable(name: &str) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::NoSuchVariable,
        format!("undeclared reference to '{name}'"),
    )
}

/// Field missing from a struct or selection target.
#[cold]
pub fn no_such_field(field: &str) -> ErrorValue {
    ErrorValue::new(ErrorKind::NoSuchField, format!("no such field '{field}'"))
}

/// Map lookup with an absent key.
#[cold]
pub fn no_such_key(key: &str) -> ErrorValue {
    ErrorValue::new(ErrorKind::NoSuchKey, format!("no such key: {key}"))
}

/// List index outside `0..len`.
#[cold]
pub fn index_out_of_range(index: i64, len: usize) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::IndexOutOfRange,
        format!("index {index} out of range for list of size {len}"),
    )
}

/// No implementation matches the call site.
#[cold]
pub fn no_such_overload(context: &str) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::NoSuchOverload,
        format!("no such overload: {context}"),
    )
}

/// More than one implementation matches a dynamic call.
#[cold]
pub fn ambiguous_overload(function: &str, arity: usize) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::AmbiguousOverload,
        format!("ambiguous overload for '{function}' with {arity} argument(s)"),
    )
}

/// Value cannot be represented in the requested type.
#[cold]
pub fn type_conversion(from: &str, to: &str) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::TypeConversion,
        format!("cannot convert {from} to {to}"),
    )
}

/// Division or modulo by zero.
#[cold]
pub fn divide_by_zero() -> ErrorValue {
    ErrorValue::new(ErrorKind::DivideByZero, "division by zero")
}

/// Modulo by zero (same kind as division; distinct message).
#[cold]
pub fn modulo_by_zero() -> ErrorValue {
    ErrorValue::new(ErrorKind::DivideByZero, "modulus by zero")
}

/// Checked arithmetic left the representable range.
#[cold]
pub fn overflow(operation: &str) -> ErrorValue {
    ErrorValue::new(
        ErrorKind::Overflow,
        format!("integer overflow in {operation}"),
    )
}

/// Pattern failed to compile.
#[cold]
pub fn regex_error(detail: &str) -> ErrorValue {
    ErrorValue::new(ErrorKind::Regex, detail.to_string())
}

/// Invariant violation inside the evaluator itself.
#[cold]
pub fn internal(detail: impl Into<String>) -> ErrorValue {
    ErrorValue::new(ErrorKind::Internal, detail)
}
