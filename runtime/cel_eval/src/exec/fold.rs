//! The comprehension fold.
//!
//! One node shape serves `exists`, `all`, `exists_one`, `map`, and `filter`:
//! bind the accumulator to its init value, iterate the range, check the loop
//! condition (a concrete `false` terminates, errors and unknowns do not),
//! fold the step into the accumulator, and evaluate the result against the
//! final accumulator binding.
//!
//! Per-iteration bindings are frames layered over the enclosing activation;
//! the enclosing frame is never mutated, so nested comprehensions shadow
//! freely.

use cel_value::error as err;
use cel_value::Value;

use crate::activation::Activation;

use super::{tag_error, EvalCtx, EvalNode};

use std::sync::Arc;

/// A planned comprehension.
#[derive(Debug)]
pub struct FoldNode {
    /// Node id of the comprehension expression.
    pub id: i64,
    pub iter_var: String,
    pub accu_var: String,
    pub iter_range: Arc<EvalNode>,
    pub accu_init: Arc<EvalNode>,
    pub loop_cond: Arc<EvalNode>,
    pub loop_step: Arc<EvalNode>,
    pub result: Arc<EvalNode>,
}

/// A single-variable frame over an enclosing activation.
struct VarActivation<'a> {
    parent: &'a dyn Activation,
    name: &'a str,
    value: Value,
}

impl Activation for VarActivation<'_> {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        if name == self.name {
            Some(self.value.clone())
        } else {
            self.parent.resolve_name(name)
        }
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.parent)
    }
}

impl FoldNode {
    /// Run the fold.
    pub fn eval(&self, ctx: &EvalCtx) -> Value {
        // The iter-range is evaluated exactly once.
        let range = self.iter_range.eval(ctx);
        if range.is_unknown_or_error() {
            return range;
        }
        let Some(iterator) = range.iter_value() else {
            return tag_error(
                Value::error(err::no_such_overload(&format!(
                    "{} is not iterable",
                    range.type_name()
                ))),
                self.iter_range.id(),
            );
        };

        let mut accumulator = self.accu_init.eval(ctx);
        for element in iterator {
            let accu_frame = VarActivation {
                parent: ctx.activation,
                name: &self.accu_var,
                value: accumulator.clone(),
            };
            let iter_frame = VarActivation {
                parent: &accu_frame,
                name: &self.iter_var,
                value: element,
            };
            let frame_ctx = ctx.with_activation(&iter_frame);

            let condition = self.loop_cond.eval(&frame_ctx);
            match condition.as_bool() {
                Some(false) => break,
                Some(true) => {}
                // Errors and unknowns do not terminate the loop: the step
                // decides what the accumulator absorbs. A concrete non-bool
                // condition is a hard failure.
                None if condition.is_unknown_or_error() => {}
                None => {
                    return tag_error(
                        Value::error(err::no_such_overload(&format!(
                            "comprehension condition has type {}",
                            condition.type_name()
                        ))),
                        self.loop_cond.id(),
                    )
                }
            }
            accumulator = self.loop_step.eval(&frame_ctx);
        }

        let result_frame = VarActivation {
            parent: ctx.activation,
            name: &self.accu_var,
            value: accumulator,
        };
        self.result.eval(&ctx.with_activation(&result_frame))
    }
}
