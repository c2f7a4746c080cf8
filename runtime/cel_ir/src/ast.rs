//! Expression tree nodes.
//!
//! Every node carries a unique `i64` id assigned by the producer of the tree.
//! Ids drive diagnostics, partial-evaluation markers, and unknown tracking;
//! the evaluator never renumbers them.
//!
//! Children are boxed rather than arena-indexed: the tree crosses an API
//! boundary with ids preassigned by an external producer, so index-based ids
//! are not an option here.

use std::fmt;

/// A single expression node: an id plus a shape-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Unique id within the tree.
    pub id: i64,
    /// Node shape and payload.
    pub kind: ExprKind,
}

/// Expression node payloads, one variant per AST shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Literal constant: `42`, `"hi"`, `b"\x00"`, `null`.
    Const(Constant),

    /// Identifier reference, possibly dot-qualified: `x`, `pkg.x`.
    Ident(String),

    /// Field selection: `operand.field`, or `has(operand.field)` when
    /// `test_only` is set.
    Select {
        operand: Box<Expr>,
        field: String,
        test_only: bool,
    },

    /// Function or method call.
    ///
    /// `target` is the receiver for method-style calls (`s.contains(x)`);
    /// global calls (`size(s)`, `_+_`) leave it `None`.
    Call {
        function: String,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },

    /// List construction: `[e0, e1, …]`.
    ///
    /// `optional_indices` marks elements whose value is an optional that is
    /// skipped when empty.
    List {
        elements: Vec<Expr>,
        optional_indices: Vec<usize>,
    },

    /// Map construction: `{k0: v0, …}`.
    Map { entries: Vec<EntryExpr> },

    /// Typed object construction: `pkg.Type{field: value, …}`.
    Struct {
        type_name: String,
        fields: Vec<FieldExpr>,
    },

    /// Comprehension fold, the expanded form of `exists`, `all`, `map`,
    /// `filter`, `exists_one`.
    Comprehension(Box<ComprehensionExpr>),
}

/// A key/value entry in map construction.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryExpr {
    /// Id of the entry itself (distinct from the key and value node ids).
    pub id: i64,
    pub key: Expr,
    pub value: Expr,
    /// Entry is dropped when the value is an empty optional.
    pub optional: bool,
}

/// A field initializer in object construction.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldExpr {
    /// Id of the initializer itself.
    pub id: i64,
    pub field: String,
    pub value: Expr,
    /// Field is dropped when the value is an empty optional.
    pub optional: bool,
}

/// The comprehension fold payload.
///
/// Evaluation binds `accu_var` to `accu_init`, then for each element of
/// `iter_range` binds `iter_var`, checks `loop_cond` (concrete `false`
/// terminates), and folds `loop_step` into the accumulator; `result` is
/// evaluated against the final accumulator binding.
#[derive(Clone, Debug, PartialEq)]
pub struct ComprehensionExpr {
    pub iter_var: String,
    pub iter_range: Expr,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_cond: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

/// Literal constant payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Expr {
    /// Create a node from an id and kind.
    pub fn new(id: i64, kind: ExprKind) -> Self {
        Expr { id, kind }
    }

    /// Literal constant node.
    pub fn literal(id: i64, value: Constant) -> Self {
        Expr::new(id, ExprKind::Const(value))
    }

    /// Identifier node.
    pub fn ident(id: i64, name: impl Into<String>) -> Self {
        Expr::new(id, ExprKind::Ident(name.into()))
    }

    /// Field selection node.
    pub fn select(id: i64, operand: Expr, field: impl Into<String>) -> Self {
        Expr::new(
            id,
            ExprKind::Select {
                operand: Box::new(operand),
                field: field.into(),
                test_only: false,
            },
        )
    }

    /// Presence-test node (`has(operand.field)`).
    pub fn select_test(id: i64, operand: Expr, field: impl Into<String>) -> Self {
        Expr::new(
            id,
            ExprKind::Select {
                operand: Box::new(operand),
                field: field.into(),
                test_only: true,
            },
        )
    }

    /// Global (receiver-less) call node.
    pub fn call(id: i64, function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(
            id,
            ExprKind::Call {
                function: function.into(),
                target: None,
                args,
            },
        )
    }

    /// Method-style call node with a receiver target.
    pub fn member_call(
        id: i64,
        function: impl Into<String>,
        target: Expr,
        args: Vec<Expr>,
    ) -> Self {
        Expr::new(
            id,
            ExprKind::Call {
                function: function.into(),
                target: Some(Box::new(target)),
                args,
            },
        )
    }

    /// List construction node with no optional elements.
    pub fn list(id: i64, elements: Vec<Expr>) -> Self {
        Expr::new(
            id,
            ExprKind::List {
                elements,
                optional_indices: Vec::new(),
            },
        )
    }

    /// Map construction node.
    pub fn map(id: i64, entries: Vec<EntryExpr>) -> Self {
        Expr::new(id, ExprKind::Map { entries })
    }

    /// Object construction node.
    pub fn object(id: i64, type_name: impl Into<String>, fields: Vec<FieldExpr>) -> Self {
        Expr::new(
            id,
            ExprKind::Struct {
                type_name: type_name.into(),
                fields,
            },
        )
    }

    /// Comprehension node.
    pub fn comprehension(id: i64, fold: ComprehensionExpr) -> Self {
        Expr::new(id, ExprKind::Comprehension(Box::new(fold)))
    }

    /// Walk the subtree rooted here, calling `f` on every node (pre-order).
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Ident(_) => {}
            ExprKind::Select { operand, .. } => operand.visit(f),
            ExprKind::Call { target, args, .. } => {
                if let Some(t) = target {
                    t.visit(f);
                }
                for arg in args {
                    arg.visit(f);
                }
            }
            ExprKind::List { elements, .. } => {
                for e in elements {
                    e.visit(f);
                }
            }
            ExprKind::Map { entries } => {
                for e in entries {
                    e.key.visit(f);
                    e.value.visit(f);
                }
            }
            ExprKind::Struct { fields, .. } => {
                for fld in fields {
                    fld.value.visit(f);
                }
            }
            ExprKind::Comprehension(c) => {
                c.iter_range.visit(f);
                c.accu_init.visit(f);
                c.loop_cond.visit(f);
                c.loop_step.visit(f);
                c.result.visit(f);
            }
        }
    }
}

impl EntryExpr {
    /// Required map entry.
    pub fn new(id: i64, key: Expr, value: Expr) -> Self {
        EntryExpr {
            id,
            key,
            value,
            optional: false,
        }
    }

    /// Entry whose value is an optional, skipped when empty.
    pub fn optional(id: i64, key: Expr, value: Expr) -> Self {
        EntryExpr {
            id,
            key,
            value,
            optional: true,
        }
    }
}

impl FieldExpr {
    /// Required field initializer.
    pub fn new(id: i64, field: impl Into<String>, value: Expr) -> Self {
        FieldExpr {
            id,
            field: field.into(),
            value,
            optional: false,
        }
    }

    /// Initializer whose value is an optional, skipped when empty.
    pub fn optional(id: i64, field: impl Into<String>, value: Expr) -> Self {
        FieldExpr {
            id,
            field: field.into(),
            value,
            optional: true,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Uint(n) => write!(f, "{n}u"),
            Constant::Double(d) => write!(f, "{d}"),
            Constant::String(s) => write!(f, "{s:?}"),
            Constant::Bytes(b) => write!(f, "b{b:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn factory_methods_set_ids() {
        let e = Expr::call(
            3,
            "_+_",
            vec![
                Expr::literal(1, Constant::Int(1)),
                Expr::literal(2, Constant::Int(2)),
            ],
        );
        assert_eq!(e.id, 3);
        match &e.kind {
            ExprKind::Call { function, args, .. } => {
                assert_eq!(function, "_+_");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn visit_reaches_every_node() {
        let e = Expr::select(
            3,
            Expr::member_call(2, "f", Expr::ident(1, "x"), vec![]),
            "field",
        );
        let mut seen = Vec::new();
        e.visit(&mut |n| seen.push(n.id));
        assert_eq!(seen, vec![3, 2, 1]);
    }

    #[test]
    fn visit_covers_comprehension_parts() {
        let fold = ComprehensionExpr {
            iter_var: "x".to_string(),
            iter_range: Expr::ident(1, "items"),
            accu_var: "__result__".to_string(),
            accu_init: Expr::literal(2, Constant::Bool(false)),
            loop_cond: Expr::literal(3, Constant::Bool(true)),
            loop_step: Expr::ident(4, "__result__"),
            result: Expr::ident(5, "__result__"),
        };
        let e = Expr::comprehension(6, fold);
        let mut count = 0;
        e.visit(&mut |_| count += 1);
        assert_eq!(count, 6);
    }
}
