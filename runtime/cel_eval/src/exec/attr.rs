//! Identifier-rooted attribute resolution.
//!
//! Select and index chains rooted at an identifier plan into a single
//! attribute node carrying the container-expanded name candidates and the
//! qualifier list. Resolution first consults the partial-activation unknown
//! patterns, then resolves the most qualified name the activation answers
//! (flat bindings of dotted names shadow structured access), then walks the
//! remaining qualifiers through the container traits.

use std::sync::Arc;

use cel_value::error as err;
use cel_value::Value;

use super::{tag_error, EvalCtx, EvalNode};

/// One candidate variable name plus the number of leading qualifiers it has
/// absorbed into the dotted name.
#[derive(Clone, Debug)]
pub struct NameCandidate {
    pub name: String,
    pub consumed: usize,
}

/// A qualifier step on an attribute path.
#[derive(Clone, Debug)]
pub struct Qualifier {
    /// Node id of the select/index expression that produced this step.
    pub id: i64,
    pub kind: QualifierKind,
}

/// The shape of one qualifier step.
#[derive(Clone, Debug)]
pub enum QualifierKind {
    /// Field selection (`.name`).
    Field(String),
    /// Constant key (`[0]`, `['key']`, `[true]`).
    Const(Value),
    /// Computed key, resolved before the walk.
    Dynamic(Arc<EvalNode>),
}

/// An identifier-rooted qualifier chain.
#[derive(Clone, Debug)]
pub struct AttributeNode {
    /// Node id of the root identifier.
    pub id: i64,
    /// Candidate names, most specific container and longest dotted form
    /// first.
    pub candidates: Vec<NameCandidate>,
    /// Qualifier steps in application order.
    pub qualifiers: Vec<Qualifier>,
}

impl AttributeNode {
    /// Resolve the attribute against the activation.
    pub fn eval(&self, ctx: &EvalCtx) -> Value {
        // Dynamic qualifiers resolve first; a failing key wins over
        // everything after it on the path.
        let mut steps: Vec<Value> = Vec::with_capacity(self.qualifiers.len());
        for qualifier in &self.qualifiers {
            let step = match &qualifier.kind {
                QualifierKind::Field(name) => Value::string(name.clone()),
                QualifierKind::Const(v) => v.clone(),
                QualifierKind::Dynamic(node) => {
                    let v = node.eval(ctx);
                    if v.is_unknown_or_error() {
                        return v;
                    }
                    v
                }
            };
            steps.push(step);
        }

        // Pass 1: unknown patterns and activation bindings, most qualified
        // candidate first.
        for candidate in &self.candidates {
            let rest = &steps[candidate.consumed..];
            if let Some(unknown) = self.check_unknowns(candidate, rest, ctx) {
                return unknown;
            }
            if let Some(root) = ctx.activation.resolve_name(&candidate.name) {
                return self.walk(root, candidate.consumed, &steps);
            }
        }

        // Pass 2: the type provider may know the name (type descriptors,
        // enum constants).
        for candidate in &self.candidates {
            if let Some(root) = ctx.provider.find_ident(&candidate.name) {
                return self.walk(root, candidate.consumed, &steps);
            }
        }

        let bare = self
            .candidates
            .last()
            .map_or("", |c| c.name.as_str());
        tag_error(Value::error(err::no_such_variable(bare)), self.id)
    }

    /// Match partial-activation patterns; produce the unknown tagged with
    /// the node id at the matched depth.
    fn check_unknowns(
        &self,
        candidate: &NameCandidate,
        rest: &[Value],
        ctx: &EvalCtx,
    ) -> Option<Value> {
        let patterns = ctx.activation.find_unknowns(&candidate.name)?;
        for pattern in &patterns {
            if let Some(depth) = pattern.match_depth(&candidate.name, rest) {
                return Some(Value::unknown(self.id_at_depth(candidate.consumed, depth)));
            }
        }
        None
    }

    /// The node id `depth` matched qualifiers into the path: the root (or
    /// the last folded-in qualifier) at depth zero, the depth-th remaining
    /// qualifier otherwise.
    fn id_at_depth(&self, consumed: usize, depth: usize) -> i64 {
        let index = consumed + depth;
        if index == 0 {
            self.id
        } else {
            self.qualifiers
                .get(index - 1)
                .map_or(self.id, |q| q.id)
        }
    }

    /// Apply the remaining qualifier steps to a resolved root value.
    fn walk(&self, root: Value, consumed: usize, steps: &[Value]) -> Value {
        let mut current = root;
        for (qualifier, step) in self.qualifiers[consumed..]
            .iter()
            .zip(steps[consumed..].iter())
        {
            if current.is_unknown_or_error() {
                return current;
            }
            current = tag_error(current.get(step), qualifier.id);
        }
        current
    }
}
