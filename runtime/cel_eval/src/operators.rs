//! Operator function names.
//!
//! The parser emits calls to these mangled names for the expression
//! operators. The planner special-cases the short-circuit forms, equality,
//! the conditional, and indexing; everything else resolves through the
//! dispatcher like any other function.

/// Short-circuit conjunction.
pub const LOGICAL_AND: &str = "_&&_";
/// Short-circuit disjunction.
pub const LOGICAL_OR: &str = "_||_";
/// Logical negation.
pub const LOGICAL_NOT: &str = "!_";
/// Ternary conditional.
pub const CONDITIONAL: &str = "_?_:_";
/// Equality.
pub const EQUALS: &str = "_==_";
/// Inequality.
pub const NOT_EQUALS: &str = "_!=_";
/// Addition / concatenation.
pub const ADD: &str = "_+_";
/// Subtraction.
pub const SUBTRACT: &str = "_-_";
/// Multiplication.
pub const MULTIPLY: &str = "_*_";
/// Division.
pub const DIVIDE: &str = "_/_";
/// Modulo.
pub const MODULO: &str = "_%_";
/// Unary negation.
pub const NEGATE: &str = "-_";
/// Ordering: less-than.
pub const LESS: &str = "_<_";
/// Ordering: less-or-equal.
pub const LESS_EQUALS: &str = "_<=_";
/// Ordering: greater-than.
pub const GREATER: &str = "_>_";
/// Ordering: greater-or-equal.
pub const GREATER_EQUALS: &str = "_>=_";
/// Membership.
pub const IN: &str = "@in";
/// Indexing.
pub const INDEX: &str = "_[_]_";
/// Non-strict "is not concretely false", used by macro expansions.
pub const NOT_STRICTLY_FALSE: &str = "@not_strictly_false";
