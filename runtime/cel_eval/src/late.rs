//! Late binding: per-evaluation overload overrides without re-planning.
//!
//! A [`LateBindActivation`] wraps an activation and carries a dispatcher
//! overlay. The [`decorate`] pass rewraps every call node in a planned graph
//! with a proxy that consults the activation's overlays at evaluation time;
//! plans stay immutable, so a decorated graph remains safe for concurrent
//! reuse.
//!
//! Aggregation precedence: walking outer → inner, the first dispatcher to
//! define an id wins (a later wrapper cannot steal an id an outer activation
//! already committed to), while name lookup keeps the opposite, child-first
//! order — descending into a hierarchical activation searches the child
//! before the parent.

use std::sync::Arc;

use cel_value::Value;

use crate::activation::Activation;
use crate::dispatcher::{DispatchError, Dispatcher, Overload};
use crate::exec::{EntryNode, EvalNode, FieldNode, FoldNode};
use crate::partial::AttributePattern;

/// Activation carrying a dispatcher overlay.
pub struct LateBindActivation<'a> {
    inner: &'a dyn Activation,
    dispatcher: Arc<Dispatcher>,
}

impl<'a> LateBindActivation<'a> {
    /// Wrap `inner` with an overlay dispatcher.
    pub fn new(inner: &'a dyn Activation, dispatcher: Arc<Dispatcher>) -> Self {
        LateBindActivation { inner, dispatcher }
    }

    /// Aggregate every overlay reachable from this activation into one
    /// dispatcher, honoring outer-wins precedence.
    pub fn resolve_overloads(&self) -> Dispatcher {
        let mut overlays = Vec::new();
        self.collect_overlays(&mut overlays);
        let mut aggregated = Dispatcher::new();
        for overlay in overlays {
            aggregated.merge_missing(overlay);
        }
        aggregated
    }
}

impl Activation for LateBindActivation<'_> {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.inner.resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.inner)
    }

    fn find_unknowns(&self, name: &str) -> Option<Vec<AttributePattern>> {
        self.inner.find_unknowns(name)
    }

    fn resolve_overload(&self, id: &str) -> Option<Arc<Overload>> {
        self.dispatcher
            .find_overload(id)
            .or_else(|| self.inner.resolve_overload(id))
    }

    fn collect_overlays<'s>(&'s self, out: &mut Vec<&'s Dispatcher>) {
        out.push(&self.dispatcher);
        self.inner.collect_overlays(out);
    }
}

/// Rewrap every call node in the graph with a late-binding proxy.
///
/// Logical, equality, construction, comprehension, and attribute nodes are
/// rebuilt so their nested calls are reached; leaves are shared untouched.
pub fn decorate(node: &Arc<EvalNode>) -> Arc<EvalNode> {
    match &**node {
        EvalNode::Call(_) => Arc::new(EvalNode::LateBound {
            inner: node.clone(),
        }),
        // Already decorated graphs pass through unchanged.
        EvalNode::LateBound { .. } => node.clone(),
        EvalNode::Const { .. } | EvalNode::Ident { .. } => node.clone(),
        EvalNode::Attribute(attribute) => {
            use crate::exec::{AttributeNode, Qualifier, QualifierKind};
            let qualifiers = attribute
                .qualifiers
                .iter()
                .map(|q| Qualifier {
                    id: q.id,
                    kind: match &q.kind {
                        QualifierKind::Field(f) => QualifierKind::Field(f.clone()),
                        QualifierKind::Const(v) => QualifierKind::Const(v.clone()),
                        QualifierKind::Dynamic(inner) => QualifierKind::Dynamic(decorate(inner)),
                    },
                })
                .collect();
            Arc::new(EvalNode::Attribute(AttributeNode {
                id: attribute.id,
                candidates: attribute.candidates.clone(),
                qualifiers,
            }))
        }
        EvalNode::Select {
            id,
            operand,
            field,
            test_only,
        } => Arc::new(EvalNode::Select {
            id: *id,
            operand: decorate(operand),
            field: field.clone(),
            test_only: *test_only,
        }),
        EvalNode::Index { id, operand, index } => Arc::new(EvalNode::Index {
            id: *id,
            operand: decorate(operand),
            index: decorate(index),
        }),
        EvalNode::And {
            id,
            lhs,
            rhs,
            exhaustive,
        } => Arc::new(EvalNode::And {
            id: *id,
            lhs: decorate(lhs),
            rhs: decorate(rhs),
            exhaustive: *exhaustive,
        }),
        EvalNode::Or {
            id,
            lhs,
            rhs,
            exhaustive,
        } => Arc::new(EvalNode::Or {
            id: *id,
            lhs: decorate(lhs),
            rhs: decorate(rhs),
            exhaustive: *exhaustive,
        }),
        EvalNode::Conditional {
            id,
            cond,
            then_branch,
            else_branch,
            exhaustive,
        } => Arc::new(EvalNode::Conditional {
            id: *id,
            cond: decorate(cond),
            then_branch: decorate(then_branch),
            else_branch: decorate(else_branch),
            exhaustive: *exhaustive,
        }),
        EvalNode::Equal {
            id,
            lhs,
            rhs,
            negate,
        } => Arc::new(EvalNode::Equal {
            id: *id,
            lhs: decorate(lhs),
            rhs: decorate(rhs),
            negate: *negate,
        }),
        EvalNode::CreateList {
            id,
            elements,
            optional_indices,
        } => Arc::new(EvalNode::CreateList {
            id: *id,
            elements: elements.iter().map(decorate).collect(),
            optional_indices: optional_indices.clone(),
        }),
        EvalNode::CreateMap { id, entries } => Arc::new(EvalNode::CreateMap {
            id: *id,
            entries: entries
                .iter()
                .map(|e| EntryNode {
                    id: e.id,
                    key: decorate(&e.key),
                    value: decorate(&e.value),
                    optional: e.optional,
                })
                .collect(),
        }),
        EvalNode::CreateStruct {
            id,
            type_name,
            fields,
        } => Arc::new(EvalNode::CreateStruct {
            id: *id,
            type_name: type_name.clone(),
            fields: fields
                .iter()
                .map(|f| FieldNode {
                    id: f.id,
                    field: f.field.clone(),
                    value: decorate(&f.value),
                    optional: f.optional,
                })
                .collect(),
        }),
        EvalNode::Fold(fold) => Arc::new(EvalNode::Fold(Arc::new(FoldNode {
            id: fold.id,
            iter_var: fold.iter_var.clone(),
            accu_var: fold.accu_var.clone(),
            iter_range: decorate(&fold.iter_range),
            accu_init: decorate(&fold.accu_init),
            loop_cond: decorate(&fold.loop_cond),
            loop_step: decorate(&fold.loop_step),
            result: decorate(&fold.result),
        }))),
    }
}

/// Validate a candidate activation's overloads against a reference
/// dispatcher.
///
/// For every id both sides define, the arity slot and strictness must match
/// (*InvalidSignature*) and the operand trait must match
/// (*MismatchedAttribute*). Ids only one side defines are untouched.
pub fn validate_overlays(
    activation: &LateBindActivation<'_>,
    reference: &Dispatcher,
) -> Result<(), DispatchError> {
    let aggregated = activation.resolve_overloads();
    for id in aggregated.overload_ids() {
        let Some(reference_overload) = reference.find_overload(id) else {
            continue;
        };
        let Some(candidate) = aggregated.find_overload(id) else {
            continue;
        };
        if candidate.style != reference_overload.style
            || candidate.non_strict != reference_overload.non_strict
        {
            return Err(DispatchError::InvalidSignature {
                id: id.to_string(),
                detail: format!(
                    "expected {} (non-strict: {}), found {} (non-strict: {})",
                    reference_overload.style,
                    reference_overload.non_strict,
                    candidate.style,
                    candidate.non_strict
                ),
            });
        }
        if candidate.operand_trait != reference_overload.operand_trait {
            return Err(DispatchError::MismatchedAttribute {
                id: id.to_string(),
                detail: format!(
                    "expected operand trait {:?}, found {:?}",
                    reference_overload.operand_trait, candidate.operand_trait
                ),
            });
        }
    }
    Ok(())
}
