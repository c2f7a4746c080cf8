//! Short-circuit logic, the conditional, and equality.
//!
//! The logical operators are commutative under any interleaving of errors
//! and unknowns: a decisive boolean on either side wins, unknowns beat
//! errors, and the left side beats the right within each class. In
//! exhaustive mode both sides are always evaluated (so their values land in
//! the eval state) but the combination rules are identical.

use cel_value::error as err;
use cel_value::Value;

use super::{maybe_no_such_overload, tag_error, EvalCtx, EvalNode};

/// `lhs || rhs`.
pub fn eval_or(id: i64, lhs: &EvalNode, rhs: &EvalNode, exhaustive: bool, ctx: &EvalCtx) -> Value {
    let left = lhs.eval(ctx);
    if !exhaustive && left.as_bool() == Some(true) {
        return Value::Bool(true);
    }
    let right = rhs.eval(ctx);
    combine_or(id, left, right)
}

fn combine_or(id: i64, left: Value, right: Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(true), _) | (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => combine_undecided(id, left, right, "||"),
    }
}

/// `lhs && rhs`, symmetric with [`eval_or`] around `false`.
pub fn eval_and(id: i64, lhs: &EvalNode, rhs: &EvalNode, exhaustive: bool, ctx: &EvalCtx) -> Value {
    let left = lhs.eval(ctx);
    if !exhaustive && left.as_bool() == Some(false) {
        return Value::Bool(false);
    }
    let right = rhs.eval(ctx);
    combine_and(id, left, right)
}

fn combine_and(id: i64, left: Value, right: Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(false), _) | (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => combine_undecided(id, left, right, "&&"),
    }
}

/// Neither side decided the operator: unknowns win over errors, left over
/// right, and a concrete non-bool operand becomes a *NoSuchOverload*.
fn combine_undecided(id: i64, left: Value, right: Value, op: &str) -> Value {
    if left.is_unknown() {
        return left;
    }
    if right.is_unknown() {
        return right;
    }
    if left.is_error() {
        return tag_error(left, id);
    }
    if right.is_error() {
        return tag_error(right, id);
    }
    tag_error(Value::error(err::no_such_overload(op)), id)
}

/// `cond ? then : else`.
pub fn eval_conditional(
    id: i64,
    cond: &EvalNode,
    then_branch: &EvalNode,
    else_branch: &EvalNode,
    exhaustive: bool,
    ctx: &EvalCtx,
) -> Value {
    let condition = cond.eval(ctx);
    if exhaustive {
        let then_value = then_branch.eval(ctx);
        let else_value = else_branch.eval(ctx);
        return match condition.as_bool() {
            Some(true) => then_value,
            Some(false) => else_value,
            None => maybe_no_such_overload(condition, "?:", id),
        };
    }
    match condition.as_bool() {
        Some(true) => then_branch.eval(ctx),
        Some(false) => else_branch.eval(ctx),
        None => maybe_no_such_overload(condition, "?:", id),
    }
}

/// `lhs == rhs` (negated for `!=`).
///
/// Both sides evaluate; a failing side propagates (left preferred) and
/// concrete values of unrelated types compare unequal rather than erroring.
pub fn eval_equal(id: i64, lhs: &EvalNode, rhs: &EvalNode, negate: bool, ctx: &EvalCtx) -> Value {
    let left = lhs.eval(ctx);
    let right = rhs.eval(ctx);
    if left.is_unknown_or_error() {
        return tag_error(left, id);
    }
    if right.is_unknown_or_error() {
        return tag_error(right, id);
    }
    Value::Bool(left.equal(&right) != negate)
}
