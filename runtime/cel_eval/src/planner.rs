//! The planner: expression tree → evaluation node graph.
//!
//! Planning resolves everything that does not depend on the activation:
//! container candidates for names, checker reference substitutions, overload
//! binding, and the special forms (`&&`, `||`, `?:`, `==`, `!=`, indexing).
//! The output graph references the dispatcher it was planned against; reuse
//! with a different static dispatcher requires re-planning, and late binding
//! is the only supported per-call override.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use cel_ir::{CheckedExpr, Constant, Expr, ExprKind};
use cel_value::{TypeProvider, Value};

use crate::container::Container;
use crate::dispatcher::Dispatcher;
use crate::exec::{
    AttributeNode, CallNode, EntryNode, EvalNode, FieldNode, FoldNode, NameCandidate, Qualifier,
    QualifierKind,
};
use crate::operators;

/// Planning failures (host-facing).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// Object construction named a type the provider does not know.
    NoSuchType { name: String, id: i64 },
    /// A special form arrived with the wrong argument count.
    MalformedCall {
        function: String,
        id: i64,
        expected: usize,
        found: usize,
    },
    /// A checked expression carried no tree.
    MissingExpression,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::NoSuchType { name, id } => {
                write!(f, "no such type '{name}' (node {id})")
            }
            PlanError::MalformedCall {
                function,
                id,
                expected,
                found,
            } => write!(
                f,
                "call to '{function}' (node {id}) expects {expected} argument(s), found {found}"
            ),
            PlanError::MissingExpression => write!(f, "checked expression has no tree"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Convert a literal constant into its runtime value.
pub fn const_to_value(constant: &Constant) -> Value {
    match constant {
        Constant::Null => Value::Null,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(n) => Value::Int(*n),
        Constant::Uint(n) => Value::Uint(*n),
        Constant::Double(d) => Value::Double(*d),
        Constant::String(s) => Value::string(s.clone()),
        Constant::Bytes(b) => Value::bytes(b.clone()),
    }
}

/// Plans one expression tree into an immutable evaluation graph.
pub struct Planner<'a> {
    dispatcher: &'a Dispatcher,
    provider: &'a dyn TypeProvider,
    container: &'a Container,
    checked: Option<&'a CheckedExpr>,
    exhaustive: bool,
    /// Identifier nodes memoized per name within this plan.
    idents: RefCell<FxHashMap<String, Arc<EvalNode>>>,
}

impl<'a> Planner<'a> {
    /// Planner over a static dispatcher, provider, and container.
    pub fn new(
        dispatcher: &'a Dispatcher,
        provider: &'a dyn TypeProvider,
        container: &'a Container,
        checked: Option<&'a CheckedExpr>,
        exhaustive: bool,
    ) -> Self {
        Planner {
            dispatcher,
            provider,
            container,
            checked,
            exhaustive,
            idents: RefCell::new(FxHashMap::default()),
        }
    }

    /// Plan an expression into an evaluation node.
    pub fn plan(&self, expr: &Expr) -> Result<Arc<EvalNode>, PlanError> {
        match &expr.kind {
            ExprKind::Const(constant) => Ok(Arc::new(EvalNode::Const {
                id: expr.id,
                value: const_to_value(constant),
            })),
            ExprKind::Ident(name) => Ok(self.plan_ident(expr.id, name)),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => self.plan_select(expr.id, operand, field, *test_only),
            ExprKind::Call {
                function,
                target,
                args,
            } => self.plan_call(expr.id, function, target.as_deref(), args),
            ExprKind::List {
                elements,
                optional_indices,
            } => {
                let planned = elements
                    .iter()
                    .map(|e| self.plan(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(EvalNode::CreateList {
                    id: expr.id,
                    elements: planned,
                    optional_indices: optional_indices.clone(),
                }))
            }
            ExprKind::Map { entries } => {
                let planned = entries
                    .iter()
                    .map(|entry| {
                        Ok(EntryNode {
                            id: entry.id,
                            key: self.plan(&entry.key)?,
                            value: self.plan(&entry.value)?,
                            optional: entry.optional,
                        })
                    })
                    .collect::<Result<Vec<_>, PlanError>>()?;
                Ok(Arc::new(EvalNode::CreateMap {
                    id: expr.id,
                    entries: planned,
                }))
            }
            ExprKind::Struct { type_name, fields } => {
                let resolved = self.resolve_type_name(expr.id, type_name)?;
                let planned = fields
                    .iter()
                    .map(|field| {
                        Ok(FieldNode {
                            id: field.id,
                            field: field.field.clone(),
                            value: self.plan(&field.value)?,
                            optional: field.optional,
                        })
                    })
                    .collect::<Result<Vec<_>, PlanError>>()?;
                Ok(Arc::new(EvalNode::CreateStruct {
                    id: expr.id,
                    type_name: resolved,
                    fields: planned,
                }))
            }
            ExprKind::Comprehension(fold) => Ok(Arc::new(EvalNode::Fold(Arc::new(FoldNode {
                id: expr.id,
                iter_var: fold.iter_var.clone(),
                accu_var: fold.accu_var.clone(),
                iter_range: self.plan(&fold.iter_range)?,
                accu_init: self.plan(&fold.accu_init)?,
                loop_cond: self.plan(&fold.loop_cond)?,
                loop_step: self.plan(&fold.loop_step)?,
                result: self.plan(&fold.result)?,
            })))),
        }
    }

    /// The checker's reference for a node, if planning a checked expression.
    fn reference(&self, id: i64) -> Option<&cel_ir::Reference> {
        self.checked.and_then(|c| c.reference(id))
    }

    /// Identifiers: checker substitutions first, then container-expanded
    /// candidates, memoized per name.
    fn plan_ident(&self, id: i64, name: &str) -> Arc<EvalNode> {
        if let Some(reference) = self.reference(id) {
            if let Some(constant) = &reference.value {
                return Arc::new(EvalNode::Const {
                    id,
                    value: const_to_value(constant),
                });
            }
            if !reference.name.is_empty() {
                return Arc::new(EvalNode::Ident {
                    id,
                    candidates: vec![reference.name.clone()],
                });
            }
        }
        if let Some(existing) = self.idents.borrow().get(name) {
            return existing.clone();
        }
        let node = Arc::new(EvalNode::Ident {
            id,
            candidates: self.container.resolve_candidate_names(name),
        });
        self.idents
            .borrow_mut()
            .insert(name.to_string(), node.clone());
        node
    }

    /// Selects fold into identifier-rooted attributes where possible so that
    /// qualified-name fallback and unknown patterns see the whole path.
    fn plan_select(
        &self,
        id: i64,
        operand: &Expr,
        field: &str,
        test_only: bool,
    ) -> Result<Arc<EvalNode>, PlanError> {
        if let Some(reference) = self.reference(id) {
            if let Some(constant) = &reference.value {
                return Ok(Arc::new(EvalNode::Const {
                    id,
                    value: const_to_value(constant),
                }));
            }
            if !reference.name.is_empty() {
                return Ok(Arc::new(EvalNode::Ident {
                    id,
                    candidates: vec![reference.name.clone()],
                }));
            }
        }
        let planned_operand = self.plan(operand)?;
        if !test_only {
            if let Some(attribute) = as_attribute(&planned_operand) {
                let qualifier = Qualifier {
                    id,
                    kind: QualifierKind::Field(field.to_string()),
                };
                return Ok(Arc::new(EvalNode::Attribute(extend_attribute(
                    attribute, qualifier, true,
                ))));
            }
        }
        Ok(Arc::new(EvalNode::Select {
            id,
            operand: planned_operand,
            field: field.to_string(),
            test_only,
        }))
    }

    fn plan_call(
        &self,
        id: i64,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Arc<EvalNode>, PlanError> {
        match function {
            operators::LOGICAL_AND if target.is_none() => {
                let [lhs, rhs] = self.plan_fixed_args(id, function, args)?;
                Ok(Arc::new(EvalNode::And {
                    id,
                    lhs,
                    rhs,
                    exhaustive: self.exhaustive,
                }))
            }
            operators::LOGICAL_OR if target.is_none() => {
                let [lhs, rhs] = self.plan_fixed_args(id, function, args)?;
                Ok(Arc::new(EvalNode::Or {
                    id,
                    lhs,
                    rhs,
                    exhaustive: self.exhaustive,
                }))
            }
            operators::CONDITIONAL if target.is_none() => {
                let [cond, then_branch, else_branch] = self.plan_fixed_args(id, function, args)?;
                Ok(Arc::new(EvalNode::Conditional {
                    id,
                    cond,
                    then_branch,
                    else_branch,
                    exhaustive: self.exhaustive,
                }))
            }
            operators::EQUALS if target.is_none() => {
                let [lhs, rhs] = self.plan_fixed_args(id, function, args)?;
                Ok(Arc::new(EvalNode::Equal {
                    id,
                    lhs,
                    rhs,
                    negate: false,
                }))
            }
            operators::NOT_EQUALS if target.is_none() => {
                let [lhs, rhs] = self.plan_fixed_args(id, function, args)?;
                Ok(Arc::new(EvalNode::Equal {
                    id,
                    lhs,
                    rhs,
                    negate: true,
                }))
            }
            operators::INDEX if target.is_none() => self.plan_index(id, function, args),
            _ => self.plan_function_call(id, function, target, args),
        }
    }

    /// Indexing extends an identifier-rooted attribute; otherwise it is a
    /// standalone index node.
    fn plan_index(
        &self,
        id: i64,
        function: &str,
        args: &[Expr],
    ) -> Result<Arc<EvalNode>, PlanError> {
        let [operand_expr, index_expr] = match args {
            [a, b] => [a, b],
            _ => {
                return Err(PlanError::MalformedCall {
                    function: function.to_string(),
                    id,
                    expected: 2,
                    found: args.len(),
                })
            }
        };
        let operand = self.plan(operand_expr)?;
        if let Some(attribute) = as_attribute(&operand) {
            let kind = match &index_expr.kind {
                ExprKind::Const(constant) => QualifierKind::Const(const_to_value(constant)),
                _ => QualifierKind::Dynamic(self.plan(index_expr)?),
            };
            let qualifier = Qualifier { id, kind };
            return Ok(Arc::new(EvalNode::Attribute(extend_attribute(
                attribute, qualifier, false,
            ))));
        }
        Ok(Arc::new(EvalNode::Index {
            id,
            operand,
            index: self.plan(index_expr)?,
        }))
    }

    fn plan_function_call(
        &self,
        id: i64,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Arc<EvalNode>, PlanError> {
        // `optional.of(x)` parses as a method call on the `optional` ident;
        // rewrite it to the namespaced global function.
        let (function, target) = match target {
            Some(Expr {
                kind: ExprKind::Ident(name),
                ..
            }) if name == "optional"
                && matches!(function, "of" | "ofNonZeroValue" | "none") =>
            {
                (format!("optional.{function}"), None)
            }
            other => (function.to_string(), other),
        };

        let mut planned_args = Vec::with_capacity(args.len() + usize::from(target.is_some()));
        if let Some(receiver) = target {
            planned_args.push(self.plan(receiver)?);
        }
        for arg in args {
            planned_args.push(self.plan(arg)?);
        }

        let mut overload_id = None;
        let mut bound = None;
        if let Some(reference) = self.reference(id) {
            if let [single] = reference.overload_ids.as_slice() {
                overload_id = Some(single.clone());
                bound = self.dispatcher.find_overload(single);
                debug!(function = %function, overload = %single, "bound checked overload");
            }
        }
        if overload_id.is_none() {
            // Unchecked fast path: a function with exactly one registered
            // overload at this arity binds eagerly.
            let candidates = self
                .dispatcher
                .find_candidates(&function, planned_args.len());
            if let [single] = candidates.as_slice() {
                overload_id = Some(single.id.clone());
                bound = Some(single.clone());
                debug!(function = %function, overload = %single.id, "bound sole overload");
            }
        }

        Ok(Arc::new(EvalNode::Call(CallNode {
            id,
            function,
            overload_id,
            bound,
            args: planned_args,
        })))
    }

    fn plan_fixed_args<const N: usize>(
        &self,
        id: i64,
        function: &str,
        args: &[Expr],
    ) -> Result<[Arc<EvalNode>; N], PlanError> {
        if args.len() != N {
            return Err(PlanError::MalformedCall {
                function: function.to_string(),
                id,
                expected: N,
                found: args.len(),
            });
        }
        let mut planned = Vec::with_capacity(N);
        for arg in args {
            planned.push(self.plan(arg)?);
        }
        planned.try_into().map_err(|_| PlanError::MalformedCall {
            function: function.to_string(),
            id,
            expected: N,
            found: args.len(),
        })
    }

    /// Expand the container candidates for an object type name and take the
    /// first one the provider knows.
    fn resolve_type_name(&self, id: i64, type_name: &str) -> Result<String, PlanError> {
        for candidate in self.container.resolve_candidate_names(type_name) {
            if self.provider.find_type(&candidate).is_some() {
                debug!(type_name, resolved = %candidate, "resolved object type");
                return Ok(candidate);
            }
        }
        Err(PlanError::NoSuchType {
            name: type_name.to_string(),
            id,
        })
    }
}

/// View a planned node as attribute parts, when it is identifier-rooted.
fn as_attribute(node: &Arc<EvalNode>) -> Option<AttributeNode> {
    match &**node {
        EvalNode::Ident { id, candidates } => Some(AttributeNode {
            id: *id,
            candidates: candidates
                .iter()
                .map(|name| NameCandidate {
                    name: name.clone(),
                    consumed: 0,
                })
                .collect(),
            qualifiers: Vec::new(),
        }),
        EvalNode::Attribute(attribute) => Some(attribute.clone()),
        _ => None,
    }
}

/// Append a qualifier to attribute parts. Field qualifiers on a pure select
/// chain also extend the dotted candidate names, so a flat binding of
/// `"a.b.c"` shadows structured access; longer names sort first.
fn extend_attribute(
    mut attribute: AttributeNode,
    qualifier: Qualifier,
    extend_names: bool,
) -> AttributeNode {
    let chain_is_pure_fields = attribute
        .qualifiers
        .iter()
        .all(|q| matches!(q.kind, QualifierKind::Field(_)));
    if extend_names && chain_is_pure_fields {
        if let QualifierKind::Field(field) = &qualifier.kind {
            let depth = attribute.qualifiers.len();
            let mut extended: Vec<NameCandidate> = attribute
                .candidates
                .iter()
                .filter(|c| c.consumed == depth)
                .map(|c| NameCandidate {
                    name: format!("{}.{field}", c.name),
                    consumed: depth + 1,
                })
                .collect();
            extended.extend(attribute.candidates);
            attribute.candidates = extended;
        }
    }
    attribute.qualifiers.push(qualifier);
    attribute
}
