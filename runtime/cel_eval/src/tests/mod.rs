//! Integration tests for the evaluation core.
//!
//! The macro expander is external, so these tests hand-build the expanded
//! comprehension trees for `exists`, `all`, `exists_one`, `map`, and
//! `filter` exactly as the expander would emit them.

#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

mod comprehension_tests;
mod late_binding_tests;

use cel_ir::{ComprehensionExpr, Constant, Expr};
use cel_value::Value;

use crate::activation::Activation;
use crate::interpreter::{Interpreter, Program};
use crate::operators;

/// The accumulator variable name used by macro expansions.
pub(crate) const ACCU_VAR: &str = "__result__";

/// Monotonic node id source for hand-built trees.
pub(crate) struct Ids(i64);

impl Ids {
    pub(crate) fn new() -> Self {
        Ids(0)
    }

    pub(crate) fn id(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

/// `[n0, n1, …]` literal.
pub(crate) fn int_list(ids: &mut Ids, values: &[i64]) -> Expr {
    let elements = values
        .iter()
        .map(|v| Expr::literal(ids.id(), Constant::Int(*v)))
        .collect();
    Expr::list(ids.id(), elements)
}

/// The expanded form of `range.exists(var, predicate)`.
pub(crate) fn exists_macro(ids: &mut Ids, range: Expr, var: &str, predicate: Expr) -> Expr {
    let accu_init = Expr::literal(ids.id(), Constant::Bool(false));
    let not_accu = Expr::call(
        ids.id(),
        operators::LOGICAL_NOT,
        vec![Expr::ident(ids.id(), ACCU_VAR)],
    );
    let loop_cond = Expr::call(ids.id(), operators::NOT_STRICTLY_FALSE, vec![not_accu]);
    let loop_step = Expr::call(
        ids.id(),
        operators::LOGICAL_OR,
        vec![Expr::ident(ids.id(), ACCU_VAR), predicate],
    );
    let result = Expr::ident(ids.id(), ACCU_VAR);
    Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: var.to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init,
            loop_cond,
            loop_step,
            result,
        },
    )
}

/// The expanded form of `range.all(var, predicate)`.
pub(crate) fn all_macro(ids: &mut Ids, range: Expr, var: &str, predicate: Expr) -> Expr {
    let accu_init = Expr::literal(ids.id(), Constant::Bool(true));
    let loop_cond = Expr::call(
        ids.id(),
        operators::NOT_STRICTLY_FALSE,
        vec![Expr::ident(ids.id(), ACCU_VAR)],
    );
    let loop_step = Expr::call(
        ids.id(),
        operators::LOGICAL_AND,
        vec![Expr::ident(ids.id(), ACCU_VAR), predicate],
    );
    let result = Expr::ident(ids.id(), ACCU_VAR);
    Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: var.to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init,
            loop_cond,
            loop_step,
            result,
        },
    )
}

/// The expanded form of `range.map(var, transform)`.
pub(crate) fn map_macro(ids: &mut Ids, range: Expr, var: &str, transform: Expr) -> Expr {
    let accu_init = Expr::list(ids.id(), vec![]);
    let loop_cond = Expr::literal(ids.id(), Constant::Bool(true));
    let singleton = Expr::list(ids.id(), vec![transform]);
    let loop_step = Expr::call(
        ids.id(),
        operators::ADD,
        vec![Expr::ident(ids.id(), ACCU_VAR), singleton],
    );
    let result = Expr::ident(ids.id(), ACCU_VAR);
    Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: var.to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init,
            loop_cond,
            loop_step,
            result,
        },
    )
}

/// The expanded form of `range.filter(var, predicate)`.
pub(crate) fn filter_macro(ids: &mut Ids, range: Expr, var: &str, predicate: Expr) -> Expr {
    let accu_init = Expr::list(ids.id(), vec![]);
    let loop_cond = Expr::literal(ids.id(), Constant::Bool(true));
    let singleton = Expr::list(ids.id(), vec![Expr::ident(ids.id(), var)]);
    let appended = Expr::call(
        ids.id(),
        operators::ADD,
        vec![Expr::ident(ids.id(), ACCU_VAR), singleton],
    );
    let loop_step = Expr::call(
        ids.id(),
        operators::CONDITIONAL,
        vec![predicate, appended, Expr::ident(ids.id(), ACCU_VAR)],
    );
    let result = Expr::ident(ids.id(), ACCU_VAR);
    Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: var.to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init,
            loop_cond,
            loop_step,
            result,
        },
    )
}

/// The expanded form of `range.exists_one(var, predicate)`.
pub(crate) fn exists_one_macro(ids: &mut Ids, range: Expr, var: &str, predicate: Expr) -> Expr {
    let accu_init = Expr::literal(ids.id(), Constant::Int(0));
    let loop_cond = Expr::literal(ids.id(), Constant::Bool(true));
    let incremented = Expr::call(
        ids.id(),
        operators::ADD,
        vec![
            Expr::ident(ids.id(), ACCU_VAR),
            Expr::literal(ids.id(), Constant::Int(1)),
        ],
    );
    let loop_step = Expr::call(
        ids.id(),
        operators::CONDITIONAL,
        vec![predicate, incremented, Expr::ident(ids.id(), ACCU_VAR)],
    );
    let result = Expr::call(
        ids.id(),
        operators::EQUALS,
        vec![
            Expr::ident(ids.id(), ACCU_VAR),
            Expr::literal(ids.id(), Constant::Int(1)),
        ],
    );
    Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: var.to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init,
            loop_cond,
            loop_step,
            result,
        },
    )
}

/// Plan an expression with the standard interpreter.
pub(crate) fn program(expr: &Expr) -> Program {
    Interpreter::standard().plan(expr).unwrap()
}

/// Plan and evaluate against an activation.
pub(crate) fn eval(expr: &Expr, activation: &dyn Activation) -> Value {
    program(expr).eval(activation)
}

/// Plan and evaluate against the empty activation.
pub(crate) fn eval_empty(expr: &Expr) -> Value {
    eval(expr, &crate::activation::EmptyActivation)
}
