//! Evaluation nodes.
//!
//! The planner compiles an expression tree into a graph of [`EvalNode`]s.
//! Nodes are immutable after planning and shared through `Arc`, so a planned
//! graph can be reused across activations and threads. Dispatch is a single
//! enum match; the per-shape semantics live in the sibling modules.
//!
//! Every node records its result into the optional [`EvalState`] as it
//! completes, which is what exhaustive mode builds on.

pub mod attr;
pub mod call;
pub mod construct;
pub mod fold;
pub mod logic;

pub use attr::{AttributeNode, NameCandidate, Qualifier, QualifierKind};
pub use call::CallNode;
pub use construct::{EntryNode, FieldNode};
pub use fold::FoldNode;

use std::sync::Arc;

use cel_value::error as err;
use cel_value::{TypeProvider, Value};

use crate::activation::Activation;
use crate::dispatcher::Dispatcher;
use crate::state::EvalState;

/// Everything a node needs during one evaluation.
#[derive(Clone, Copy)]
pub struct EvalCtx<'a> {
    /// The runtime binding environment.
    pub activation: &'a dyn Activation,
    /// The static dispatcher the graph was planned against.
    pub dispatcher: &'a Dispatcher,
    /// Type provider for identifier fallback and object construction.
    pub provider: &'a dyn TypeProvider,
    /// Optional per-node value recording.
    pub state: Option<&'a EvalState>,
}

impl<'a> EvalCtx<'a> {
    /// The same context with a different (possibly shorter-lived)
    /// activation, for comprehension frames.
    pub(crate) fn with_activation<'b>(&self, activation: &'b dyn Activation) -> EvalCtx<'b>
    where
        'a: 'b,
    {
        EvalCtx {
            activation,
            dispatcher: self.dispatcher,
            provider: self.provider,
            state: self.state,
        }
    }
}

/// One evaluation node; one variant per planned shape.
#[derive(Debug)]
pub enum EvalNode {
    /// Literal constant.
    Const { id: i64, value: Value },
    /// Bare identifier with container-expanded candidate names.
    Ident { id: i64, candidates: Vec<String> },
    /// Identifier-rooted qualifier chain (selects and indexes).
    Attribute(AttributeNode),
    /// Field selection (or presence test) on an arbitrary operand.
    Select {
        id: i64,
        operand: Arc<EvalNode>,
        field: String,
        test_only: bool,
    },
    /// Index into the result of an arbitrary operand.
    Index {
        id: i64,
        operand: Arc<EvalNode>,
        index: Arc<EvalNode>,
    },
    /// Short-circuit conjunction.
    And {
        id: i64,
        lhs: Arc<EvalNode>,
        rhs: Arc<EvalNode>,
        exhaustive: bool,
    },
    /// Short-circuit disjunction.
    Or {
        id: i64,
        lhs: Arc<EvalNode>,
        rhs: Arc<EvalNode>,
        exhaustive: bool,
    },
    /// Ternary conditional.
    Conditional {
        id: i64,
        cond: Arc<EvalNode>,
        then_branch: Arc<EvalNode>,
        else_branch: Arc<EvalNode>,
        exhaustive: bool,
    },
    /// Equality / inequality.
    Equal {
        id: i64,
        lhs: Arc<EvalNode>,
        rhs: Arc<EvalNode>,
        negate: bool,
    },
    /// Function call (zero/unary/binary/var-args, bound or dynamic).
    Call(CallNode),
    /// List construction.
    CreateList {
        id: i64,
        elements: Vec<Arc<EvalNode>>,
        optional_indices: Vec<usize>,
    },
    /// Map construction.
    CreateMap { id: i64, entries: Vec<EntryNode> },
    /// Object construction through the type provider.
    CreateStruct {
        id: i64,
        type_name: String,
        fields: Vec<FieldNode>,
    },
    /// Comprehension fold.
    Fold(Arc<FoldNode>),
    /// Late-binding proxy around a call node.
    LateBound { inner: Arc<EvalNode> },
}

impl EvalNode {
    /// The id of the expression node this evaluation node was planned from.
    pub fn id(&self) -> i64 {
        match self {
            EvalNode::Const { id, .. }
            | EvalNode::Ident { id, .. }
            | EvalNode::Select { id, .. }
            | EvalNode::Index { id, .. }
            | EvalNode::And { id, .. }
            | EvalNode::Or { id, .. }
            | EvalNode::Conditional { id, .. }
            | EvalNode::Equal { id, .. }
            | EvalNode::CreateList { id, .. }
            | EvalNode::CreateMap { id, .. }
            | EvalNode::CreateStruct { id, .. } => *id,
            EvalNode::Attribute(a) => a.id,
            EvalNode::Call(c) => c.id,
            EvalNode::Fold(f) => f.id,
            EvalNode::LateBound { inner } => inner.id(),
        }
    }

    /// Evaluate against an activation, recording into the state if present.
    pub fn eval(&self, ctx: &EvalCtx) -> Value {
        let value = self.eval_inner(ctx);
        if let Some(state) = ctx.state {
            state.record(self.id(), &value);
        }
        value
    }

    fn eval_inner(&self, ctx: &EvalCtx) -> Value {
        match self {
            EvalNode::Const { value, .. } => value.clone(),
            EvalNode::Ident { id, candidates } => eval_ident(*id, candidates, ctx),
            EvalNode::Attribute(node) => node.eval(ctx),
            EvalNode::Select {
                id,
                operand,
                field,
                test_only,
            } => eval_select(*id, operand, field, *test_only, ctx),
            EvalNode::Index { id, operand, index } => eval_index(*id, operand, index, ctx),
            EvalNode::And {
                id,
                lhs,
                rhs,
                exhaustive,
            } => logic::eval_and(*id, lhs, rhs, *exhaustive, ctx),
            EvalNode::Or {
                id,
                lhs,
                rhs,
                exhaustive,
            } => logic::eval_or(*id, lhs, rhs, *exhaustive, ctx),
            EvalNode::Conditional {
                id,
                cond,
                then_branch,
                else_branch,
                exhaustive,
            } => logic::eval_conditional(*id, cond, then_branch, else_branch, *exhaustive, ctx),
            EvalNode::Equal {
                id,
                lhs,
                rhs,
                negate,
            } => logic::eval_equal(*id, lhs, rhs, *negate, ctx),
            EvalNode::Call(call) => call.eval(ctx),
            EvalNode::CreateList {
                id,
                elements,
                optional_indices,
            } => construct::eval_list(*id, elements, optional_indices, ctx),
            EvalNode::CreateMap { id, entries } => construct::eval_map(*id, entries, ctx),
            EvalNode::CreateStruct {
                id,
                type_name,
                fields,
            } => construct::eval_struct(*id, type_name, fields, ctx),
            EvalNode::Fold(fold) => fold.eval(ctx),
            EvalNode::LateBound { inner } => call::eval_late_bound(inner, ctx),
        }
    }
}

/// Attach the originating node id to an error value that has none yet.
pub(crate) fn tag_error(value: Value, id: i64) -> Value {
    match value {
        Value::Error(e) if e.id.is_none() => {
            let mut tagged = (*e).clone();
            tagged.id = Some(id);
            Value::error(tagged)
        }
        other => other,
    }
}

/// Identifier resolution: activation first, then the type provider, then
/// unknown tagged with the node's own id.
fn eval_ident(id: i64, candidates: &[String], ctx: &EvalCtx) -> Value {
    for name in candidates {
        if let Some(patterns) = ctx.activation.find_unknowns(name) {
            if patterns.iter().any(|p| p.match_depth(name, &[]).is_some()) {
                return Value::unknown(id);
            }
        }
        if let Some(value) = ctx.activation.resolve_name(name) {
            return value;
        }
    }
    for name in candidates {
        if let Some(value) = ctx.provider.find_ident(name) {
            return value;
        }
    }
    Value::unknown(id)
}

/// Field selection over an evaluated operand.
fn eval_select(id: i64, operand: &EvalNode, field: &str, test_only: bool, ctx: &EvalCtx) -> Value {
    let target = operand.eval(ctx);
    if target.is_unknown_or_error() {
        return target;
    }
    if test_only {
        return tag_error(target.is_set(field), id);
    }
    tag_error(target.get(&Value::string(field)), id)
}

/// Index over an evaluated operand.
fn eval_index(id: i64, operand: &EvalNode, index: &EvalNode, ctx: &EvalCtx) -> Value {
    let target = operand.eval(ctx);
    if target.is_unknown_or_error() {
        return target;
    }
    let key = index.eval(ctx);
    if key.is_unknown_or_error() {
        return key;
    }
    tag_error(target.get(&key), id)
}

/// `v` if it is already failing, otherwise a *NoSuchOverload* for `context`.
pub(crate) fn maybe_no_such_overload(value: Value, context: &str, id: i64) -> Value {
    if value.is_unknown_or_error() {
        tag_error(value, id)
    } else {
        tag_error(Value::error(err::no_such_overload(context)), id)
    }
}
