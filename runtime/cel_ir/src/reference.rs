//! Checker annotations.
//!
//! A type checker may resolve identifiers, selects, and call overloads ahead
//! of evaluation. Its findings arrive as side tables keyed by node id; when
//! present, the planner trusts them.

use rustc_hash::FxHashMap;

use crate::ast::{Constant, Expr};
use crate::source::SourceInfo;

/// Resolution of a single node recorded by the checker.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Reference {
    /// Fully qualified name the node resolved to (idents and selects).
    pub name: String,
    /// Overload ids a call node resolved to; a single entry lets the planner
    /// bind the implementation at plan time.
    pub overload_ids: Vec<String>,
    /// Constant value for enum-like identifiers.
    pub value: Option<Constant>,
}

impl Reference {
    /// Identifier resolution to a (possibly rewritten) qualified name.
    pub fn to_name(name: impl Into<String>) -> Self {
        Reference {
            name: name.into(),
            ..Reference::default()
        }
    }

    /// Identifier resolution to a constant (enum values).
    pub fn to_value(name: impl Into<String>, value: Constant) -> Self {
        Reference {
            name: name.into(),
            value: Some(value),
            ..Reference::default()
        }
    }

    /// Call resolution to one or more candidate overload ids.
    pub fn to_overloads(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Reference {
            overload_ids: ids.into_iter().map(Into::into).collect(),
            ..Reference::default()
        }
    }
}

/// A checked expression: the tree plus the checker's side tables.
#[derive(Clone, Debug, Default)]
pub struct CheckedExpr {
    /// The expression tree. `None` only for the `Default` placeholder.
    pub expr: Option<Expr>,
    /// Node id → resolved reference.
    pub references: FxHashMap<i64, Reference>,
    /// Node id → checked type name, kept for diagnostics.
    pub types: FxHashMap<i64, String>,
    /// Source positions for error reporting.
    pub source: SourceInfo,
}

impl CheckedExpr {
    /// Wrap a tree with empty annotation tables.
    pub fn unchecked(expr: Expr) -> Self {
        CheckedExpr {
            expr: Some(expr),
            ..CheckedExpr::default()
        }
    }

    /// Attach a reference for a node id.
    #[must_use]
    pub fn with_reference(mut self, id: i64, reference: Reference) -> Self {
        self.references.insert(id, reference);
        self
    }

    /// Look up the reference for a node id.
    pub fn reference(&self, id: i64) -> Option<&Reference> {
        self.references.get(&id)
    }
}
