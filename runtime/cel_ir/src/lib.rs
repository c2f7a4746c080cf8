//! CEL IR - expression tree types for the CEL evaluation core.
//!
//! This crate defines the frozen expression tree the planner consumes. Trees
//! are produced externally (parser, macro expander, optional type checker)
//! and arrive with node ids preassigned; nothing in this crate evaluates
//! anything.
//!
//! # Contents
//!
//! - [`Expr`] / [`ExprKind`]: the tree itself, one variant per node shape
//! - [`Constant`]: literal payloads
//! - [`Reference`] / [`CheckedExpr`]: annotations a type checker may attach
//! - [`SourceInfo`]: node id → source offset, for diagnostics

mod ast;
mod reference;
mod source;

pub use ast::{ComprehensionExpr, Constant, EntryExpr, Expr, ExprKind, FieldExpr};
pub use reference::{CheckedExpr, Reference};
pub use source::SourceInfo;
