//! Overload registry and dynamic dispatch.
//!
//! A [`Dispatcher`] maps globally unique overload ids to implementations and
//! keeps a per-function index for dynamic (unchecked) calls. Registration is
//! host-facing and fails with typed errors; dispatch is evaluation-facing and
//! fails with in-band error values.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

use cel_value::error as err;
use cel_value::{CelType, Traits, Value};

/// Zero-argument or variadic implementation.
pub type FunctionOp = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;
/// Single-argument implementation.
pub type UnaryOp = Arc<dyn Fn(Value) -> Value + Send + Sync>;
/// Two-argument implementation.
pub type BinaryOp = Arc<dyn Fn(Value, Value) -> Value + Send + Sync>;

/// Declared arity class of an overload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallStyle {
    Zero,
    Unary,
    Binary,
    VarArgs,
}

impl fmt::Display for CallStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CallStyle::Zero => "zero",
            CallStyle::Unary => "unary",
            CallStyle::Binary => "binary",
            CallStyle::VarArgs => "var-args",
        };
        f.write_str(label)
    }
}

/// The populated implementation slot of an overload.
#[derive(Clone)]
pub enum OverloadImpl {
    Zero(FunctionOp),
    Unary(UnaryOp),
    Binary(BinaryOp),
    VarArgs(FunctionOp),
}

impl OverloadImpl {
    /// The arity class this slot belongs to.
    pub fn style(&self) -> CallStyle {
        match self {
            OverloadImpl::Zero(_) => CallStyle::Zero,
            OverloadImpl::Unary(_) => CallStyle::Unary,
            OverloadImpl::Binary(_) => CallStyle::Binary,
            OverloadImpl::VarArgs(_) => CallStyle::VarArgs,
        }
    }
}

impl fmt::Debug for OverloadImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OverloadImpl::{}", self.style())
    }
}

/// A single-signature implementation bound to an overload id.
///
/// Several overloads may share a function name; the id is unique within a
/// dispatcher.
#[derive(Clone, Debug)]
pub struct Overload {
    /// Globally unique operator id (`"add_int64"`).
    pub id: String,
    /// Function name, shared across sibling overloads (`"_+_"`).
    pub function: String,
    /// Declared arity class; must agree with the implementation slot.
    pub style: CallStyle,
    /// Trait the first argument's type must carry, or empty for none.
    pub operand_trait: Traits,
    /// Non-strict overloads are invoked even with error/unknown arguments.
    pub non_strict: bool,
    /// Declared argument types for dynamic dispatch; empty means every
    /// parameter is `dyn`.
    pub arg_types: Vec<CelType>,
    /// The implementation.
    pub imp: OverloadImpl,
}

impl Overload {
    /// Zero-argument overload.
    pub fn zero(
        id: impl Into<String>,
        function: impl Into<String>,
        f: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Overload {
            id: id.into(),
            function: function.into(),
            style: CallStyle::Zero,
            operand_trait: Traits::empty(),
            non_strict: false,
            arg_types: Vec::new(),
            imp: OverloadImpl::Zero(Arc::new(f)),
        }
    }

    /// Unary overload.
    pub fn unary(
        id: impl Into<String>,
        function: impl Into<String>,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Overload {
            id: id.into(),
            function: function.into(),
            style: CallStyle::Unary,
            operand_trait: Traits::empty(),
            non_strict: false,
            arg_types: Vec::new(),
            imp: OverloadImpl::Unary(Arc::new(f)),
        }
    }

    /// Binary overload.
    pub fn binary(
        id: impl Into<String>,
        function: impl Into<String>,
        f: impl Fn(Value, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Overload {
            id: id.into(),
            function: function.into(),
            style: CallStyle::Binary,
            operand_trait: Traits::empty(),
            non_strict: false,
            arg_types: Vec::new(),
            imp: OverloadImpl::Binary(Arc::new(f)),
        }
    }

    /// Variadic overload.
    pub fn var_args(
        id: impl Into<String>,
        function: impl Into<String>,
        f: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Overload {
            id: id.into(),
            function: function.into(),
            style: CallStyle::VarArgs,
            operand_trait: Traits::empty(),
            non_strict: false,
            arg_types: Vec::new(),
            imp: OverloadImpl::VarArgs(Arc::new(f)),
        }
    }

    /// Require a trait on the first argument's type.
    #[must_use]
    pub fn with_operand_trait(mut self, operand_trait: Traits) -> Self {
        self.operand_trait = operand_trait;
        self
    }

    /// Mark the overload non-strict.
    #[must_use]
    pub fn non_strict(mut self) -> Self {
        self.non_strict = true;
        self
    }

    /// Declare argument types for dynamic dispatch.
    #[must_use]
    pub fn with_arg_types(mut self, arg_types: Vec<CelType>) -> Self {
        self.arg_types = arg_types;
        self
    }

    /// Whether this overload accepts `argc` arguments.
    pub fn accepts_arity(&self, argc: usize) -> bool {
        match self.style {
            CallStyle::Zero => argc == 0,
            CallStyle::Unary => argc == 1,
            CallStyle::Binary => argc == 2,
            CallStyle::VarArgs => true,
        }
    }

    /// Whether already-evaluated arguments match the declared signature.
    ///
    /// Declared types are positional; a missing declaration means `dyn`.
    /// Error/unknown arguments match only non-strict overloads.
    pub fn matches_runtime_args(&self, args: &[Value]) -> bool {
        if !self.accepts_arity(args.len()) {
            return false;
        }
        for (i, arg) in args.iter().enumerate() {
            if arg.is_unknown_or_error() {
                if !self.non_strict {
                    return false;
                }
                continue;
            }
            if let Some(declared) = self.arg_types.get(i) {
                if declared.name() != "dyn" && arg.type_of() != *declared {
                    return false;
                }
            }
        }
        true
    }

    /// Invoke the implementation with already-evaluated arguments.
    ///
    /// Callers have checked arity, strictness, and the operand trait.
    pub fn invoke(&self, args: &[Value]) -> Value {
        match (&self.imp, args) {
            (OverloadImpl::Zero(f), []) => f(args),
            (OverloadImpl::Unary(f), [a]) => f(a.clone()),
            (OverloadImpl::Binary(f), [a, b]) => f(a.clone(), b.clone()),
            (OverloadImpl::VarArgs(f), _) => f(args),
            _ => Value::error(err::no_such_overload(&format!(
                "{} with {} argument(s)",
                self.function,
                args.len()
            ))),
        }
    }
}

/// Host-facing registration and validation failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// An overload with this id is already registered.
    DuplicateOverload(String),
    /// Declared arity class and implementation slot disagree, or a
    /// late-binding candidate's signature diverges from the reference.
    InvalidSignature { id: String, detail: String },
    /// A late-binding candidate's operand trait diverges from the reference.
    MismatchedAttribute { id: String, detail: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DuplicateOverload(id) => {
                write!(f, "duplicate overload id '{id}'")
            }
            DispatchError::InvalidSignature { id, detail } => {
                write!(f, "invalid signature for overload '{id}': {detail}")
            }
            DispatchError::MismatchedAttribute { id, detail } => {
                write!(f, "mismatched attribute for overload '{id}': {detail}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Registry resolving overload ids and `(function, arity)` to
/// implementations.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    overloads: FxHashMap<String, Arc<Overload>>,
    by_function: FxHashMap<String, Vec<Arc<Overload>>>,
}

impl Dispatcher {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Register overloads.
    ///
    /// Fails with *DuplicateOverload* on a repeated id and *InvalidSignature*
    /// when an overload's declared arity disagrees with its implementation
    /// slot. On failure nothing is registered, so the table is unchanged.
    pub fn add(
        &mut self,
        overloads: impl IntoIterator<Item = Overload>,
    ) -> Result<(), DispatchError> {
        let batch: Vec<Arc<Overload>> = overloads.into_iter().map(Arc::new).collect();
        for overload in &batch {
            if overload.style != overload.imp.style() {
                return Err(DispatchError::InvalidSignature {
                    id: overload.id.clone(),
                    detail: format!(
                        "declared {} but implementation is {}",
                        overload.style,
                        overload.imp.style()
                    ),
                });
            }
            if self.overloads.contains_key(&overload.id)
                || batch
                    .iter()
                    .filter(|o| o.id == overload.id)
                    .count()
                    > 1
            {
                return Err(DispatchError::DuplicateOverload(overload.id.clone()));
            }
        }
        for overload in batch {
            trace!(id = %overload.id, function = %overload.function, "register overload");
            self.by_function
                .entry(overload.function.clone())
                .or_default()
                .push(overload.clone());
            self.overloads.insert(overload.id.clone(), overload);
        }
        Ok(())
    }

    /// The overload registered under an id.
    pub fn find_overload(&self, id: &str) -> Option<Arc<Overload>> {
        self.overloads.get(id).cloned()
    }

    /// All registered overload ids, sorted for stable output.
    pub fn overload_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.overloads.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Overloads for a function name at a call arity.
    pub fn find_candidates(&self, function: &str, argc: usize) -> Vec<Arc<Overload>> {
        self.by_function
            .get(function)
            .map(|list| {
                list.iter()
                    .filter(|o| o.accepts_arity(argc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dynamic dispatch for unchecked calls over already-evaluated
    /// arguments.
    ///
    /// Exactly one runtime-matching candidate is invoked; several yield
    /// *AmbiguousOverload* and none *NoSuchOverload*. When nothing matches
    /// but an argument is already failing, that failure propagates instead
    /// (unknowns before errors).
    pub fn dispatch(&self, function: &str, args: &[Value]) -> Value {
        let candidates = self.find_candidates(function, args.len());
        let matching: Vec<&Arc<Overload>> = candidates
            .iter()
            .filter(|o| o.matches_runtime_args(args))
            .collect();
        match matching.as_slice() {
            [overload] => {
                trace!(id = %overload.id, function, "dynamic dispatch");
                overload.invoke(args)
            }
            [] => propagate_failing_arg(args).unwrap_or_else(|| {
                Value::error(err::no_such_overload(&format!(
                    "{function}({})",
                    arg_type_list(args)
                )))
            }),
            _ => Value::error(err::ambiguous_overload(function, args.len())),
        }
    }

    /// Copy every overload from `other` whose id is not yet present.
    ///
    /// Existing entries win, which is what gives outer late-binding overlays
    /// precedence over inner ones during aggregation.
    pub fn merge_missing(&mut self, other: &Dispatcher) {
        for (id, overload) in &other.overloads {
            if !self.overloads.contains_key(id) {
                self.by_function
                    .entry(overload.function.clone())
                    .or_default()
                    .push(overload.clone());
                self.overloads.insert(id.clone(), overload.clone());
            }
        }
    }

    /// Number of registered overloads.
    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    /// Whether the dispatcher has no overloads.
    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }
}

/// First unknown argument, else first error argument, if any.
pub(crate) fn propagate_failing_arg(args: &[Value]) -> Option<Value> {
    let mut first_error = None;
    for arg in args {
        if arg.is_unknown() {
            return Some(arg.clone());
        }
        if first_error.is_none() && arg.is_error() {
            first_error = Some(arg.clone());
        }
    }
    first_error
}

fn arg_type_list(args: &[Value]) -> String {
    args.iter()
        .map(Value::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}
