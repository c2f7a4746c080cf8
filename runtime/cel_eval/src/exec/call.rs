//! Call nodes.
//!
//! A call node evaluates its arguments (the receiver of a method-style call
//! is argument zero) and then invokes: the overload bound at plan time, a
//! dynamically dispatched overload, or the Receiver trait on the first
//! argument. Strict calls propagate failing arguments (unknowns before
//! errors); non-strict overloads receive them as-is.
//!
//! The late-binding proxy lives here too: it consults the activation for an
//! override of the call's overload id and, on a hit, evaluates a throwaway
//! call node with the replacement implementation, leaving the planned node
//! untouched for concurrent reuse.

use smallvec::SmallVec;
use tracing::trace;

use cel_value::error as err;
use cel_value::{Traits, Value};

use crate::dispatcher::{propagate_failing_arg, Overload};

use super::{tag_error, EvalCtx, EvalNode};

use std::sync::Arc;

/// Evaluated argument buffer; most calls have at most two arguments.
type Args = SmallVec<[Value; 2]>;

/// A planned function call.
#[derive(Clone, Debug)]
pub struct CallNode {
    /// Node id of the call expression.
    pub id: i64,
    /// Function name (`"size"`, `"_+_"`).
    pub function: String,
    /// Overload id when the checker or planner resolved one.
    pub overload_id: Option<String>,
    /// Implementation bound at plan time.
    pub bound: Option<Arc<Overload>>,
    /// Argument nodes; a method receiver is argument zero.
    pub args: Vec<Arc<EvalNode>>,
}

impl CallNode {
    /// Evaluate arguments and invoke.
    pub fn eval(&self, ctx: &EvalCtx) -> Value {
        let argv: Args = self.args.iter().map(|a| a.eval(ctx)).collect();
        match &self.bound {
            Some(overload) => self.invoke_bound(overload, &argv),
            None => self.dispatch_dynamic(&argv, ctx),
        }
    }

    /// Invoke a specific overload, applying strictness and the operand
    /// trait, with the Receiver fallback when the trait is not satisfied.
    fn invoke_bound(&self, overload: &Overload, argv: &[Value]) -> Value {
        if !overload.non_strict {
            if let Some(failing) = propagate_failing_arg(argv) {
                return failing;
            }
        }
        let trait_ok = overload.operand_trait.is_empty()
            || argv
                .first()
                .is_some_and(|a| a.type_of().has_trait(overload.operand_trait));
        if trait_ok {
            return tag_error(overload.invoke(argv), self.id);
        }
        self.try_receiver(argv)
            .unwrap_or_else(|| self.no_overload(argv))
    }

    /// Dynamic dispatch through the static dispatcher.
    fn dispatch_dynamic(&self, argv: &[Value], ctx: &EvalCtx) -> Value {
        let candidates = ctx.dispatcher.find_candidates(&self.function, argv.len());
        let matching: Vec<_> = candidates
            .iter()
            .filter(|o| o.matches_runtime_args(argv))
            .collect();
        match matching.as_slice() {
            [overload] => {
                trace!(id = %overload.id, function = %self.function, "dynamic dispatch");
                self.invoke_bound(overload, argv)
            }
            [] => propagate_failing_arg(argv)
                .or_else(|| self.try_receiver(argv))
                .unwrap_or_else(|| self.no_overload(argv)),
            _ => tag_error(
                Value::error(err::ambiguous_overload(&self.function, argv.len())),
                self.id,
            ),
        }
    }

    /// Route through the Receiver trait on the first argument, if possible.
    fn try_receiver(&self, argv: &[Value]) -> Option<Value> {
        let (target, rest) = argv.split_first()?;
        if target.is_unknown_or_error() {
            return Some(target.clone());
        }
        if !target.type_of().has_trait(Traits::RECEIVER) {
            return None;
        }
        let overload = self.overload_id.as_deref().unwrap_or_default();
        Some(tag_error(
            target.receive(&self.function, overload, rest),
            self.id,
        ))
    }

    #[cold]
    fn no_overload(&self, argv: &[Value]) -> Value {
        let types: Vec<String> = argv.iter().map(Value::type_name).collect();
        tag_error(
            Value::error(err::no_such_overload(&format!(
                "{}({})",
                self.function,
                types.join(", ")
            ))),
            self.id,
        )
    }
}

/// Late-binding proxy evaluation.
///
/// When the activation chain carries a dispatcher overlay that overrides
/// this call, a temporary call node with the replacement implementation is
/// evaluated instead; otherwise the planned node runs unchanged.
pub fn eval_late_bound(inner: &Arc<EvalNode>, ctx: &EvalCtx) -> Value {
    if let EvalNode::Call(call) = &**inner {
        if let Some(overload_id) = &call.overload_id {
            if let Some(replacement) = ctx.activation.resolve_overload(overload_id) {
                trace!(id = %overload_id, "late-binding override");
                let temporary = CallNode {
                    bound: Some(replacement),
                    ..call.clone()
                };
                return temporary.eval(ctx);
            }
        } else if let Some(replacement) = resolve_dynamic_override(call, ctx) {
            trace!(function = %call.function, "late-binding dynamic override");
            let temporary = CallNode {
                overload_id: Some(replacement.id.clone()),
                bound: Some(replacement),
                ..call.clone()
            };
            return temporary.eval(ctx);
        }
    }
    inner.eval(ctx)
}

/// For a dynamically dispatched call, the first overlay (outermost wins)
/// with exactly one candidate at the call's arity.
fn resolve_dynamic_override(call: &CallNode, ctx: &EvalCtx) -> Option<Arc<Overload>> {
    let mut overlays = Vec::new();
    ctx.activation.collect_overlays(&mut overlays);
    for overlay in overlays {
        let candidates = overlay.find_candidates(&call.function, call.args.len());
        if let [single] = candidates.as_slice() {
            return Some(single.clone());
        }
    }
    None
}
