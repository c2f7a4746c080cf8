//! Runtime binding environments.
//!
//! An [`Activation`] answers name lookups during one evaluation. Concrete
//! shapes compose: map-backed leaves with eager or lazy bindings,
//! hierarchical child-over-parent chaining, partial activations declaring
//! known-unknown attribute patterns, and late-binding activations carrying a
//! dispatcher overlay (see [`crate::late`]).
//!
//! Activations borrow their parents rather than owning them; callers keep
//! parents alive for the duration of the evaluation, and the chain is
//! acyclic by construction.

use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use cel_value::Value;

use crate::dispatcher::{Dispatcher, Overload};
use crate::partial::AttributePattern;

/// Name → value lookup with optional parent chaining.
pub trait Activation {
    /// Resolve a name; `None` when this activation (and its parents) do not
    /// bind it.
    fn resolve_name(&self, name: &str) -> Option<Value>;

    /// The parent activation, if any.
    fn parent(&self) -> Option<&dyn Activation> {
        None
    }

    /// Attribute patterns rooted at `name` (partial activations).
    fn find_unknowns(&self, name: &str) -> Option<Vec<AttributePattern>> {
        self.parent().and_then(|p| p.find_unknowns(name))
    }

    /// Resolve a late-binding overload override for an id.
    ///
    /// The walk is structural: a late-binding activation consults its own
    /// overlay before descending, and a hierarchical activation searches its
    /// child before its parent.
    fn resolve_overload(&self, id: &str) -> Option<Arc<Overload>> {
        self.parent().and_then(|p| p.resolve_overload(id))
    }

    /// Collect dispatcher overlays in precedence order (outermost first).
    fn collect_overlays<'s>(&'s self, out: &mut Vec<&'s Dispatcher>) {
        if let Some(p) = self.parent() {
            p.collect_overlays(out);
        }
    }
}

/// Activation binding nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve_name(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A stored binding: either a value or a zero-argument supplier whose first
/// result becomes the value for the rest of the call tree.
enum Binding {
    Value(Value),
    Lazy(Box<dyn Fn() -> Value>),
}

/// Map-backed activation with eager and lazy bindings.
pub struct MapActivation {
    bindings: FxHashMap<String, RefCell<Binding>>,
}

impl MapActivation {
    /// Empty activation; populate with [`MapActivation::bind`].
    pub fn new() -> Self {
        MapActivation {
            bindings: FxHashMap::default(),
        }
    }

    /// Bind an eager value.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings
            .insert(name.into(), RefCell::new(Binding::Value(value.into())));
        self
    }

    /// Bind a lazy supplier, invoked on first resolve and memoized within
    /// this activation.
    #[must_use]
    pub fn bind_lazy(
        mut self,
        name: impl Into<String>,
        supplier: impl Fn() -> Value + 'static,
    ) -> Self {
        self.bindings
            .insert(name.into(), RefCell::new(Binding::Lazy(Box::new(supplier))));
        self
    }
}

impl Default for MapActivation {
    fn default() -> Self {
        MapActivation::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapActivation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MapActivation::new(), |acc, (k, v)| acc.bind(k, v))
    }
}

impl Activation for MapActivation {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        let cell = self.bindings.get(name)?;
        let mut state = cell.borrow_mut();
        let computed = match &mut *state {
            Binding::Value(v) => return Some(v.clone()),
            // First resolve runs the supplier; the stored variant is swapped
            // so every later resolve sees the same value.
            Binding::Lazy(supplier) => supplier(),
        };
        *state = Binding::Value(computed.clone());
        Some(computed)
    }
}

/// Child-first activation pair.
pub struct HierarchicalActivation<'a> {
    parent: &'a dyn Activation,
    child: &'a dyn Activation,
}

impl<'a> HierarchicalActivation<'a> {
    /// Compose `child` over `parent`; the child shadows.
    pub fn new(parent: &'a dyn Activation, child: &'a dyn Activation) -> Self {
        HierarchicalActivation { parent, child }
    }
}

impl Activation for HierarchicalActivation<'_> {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.child
            .resolve_name(name)
            .or_else(|| self.parent.resolve_name(name))
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.parent)
    }

    fn find_unknowns(&self, name: &str) -> Option<Vec<AttributePattern>> {
        self.child
            .find_unknowns(name)
            .or_else(|| self.parent.find_unknowns(name))
    }

    fn resolve_overload(&self, id: &str) -> Option<Arc<Overload>> {
        self.child
            .resolve_overload(id)
            .or_else(|| self.parent.resolve_overload(id))
    }

    fn collect_overlays<'s>(&'s self, out: &mut Vec<&'s Dispatcher>) {
        self.child.collect_overlays(out);
        self.parent.collect_overlays(out);
    }
}

/// Activation wrapper declaring known-unknown attribute patterns.
pub struct PartialActivation<'a> {
    inner: &'a dyn Activation,
    patterns: Vec<AttributePattern>,
}

impl<'a> PartialActivation<'a> {
    /// Wrap `inner`, marking the given patterns as known-unknown.
    pub fn new(inner: &'a dyn Activation, patterns: Vec<AttributePattern>) -> Self {
        PartialActivation { inner, patterns }
    }
}

impl Activation for PartialActivation<'_> {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.inner.resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.inner)
    }

    fn find_unknowns(&self, name: &str) -> Option<Vec<AttributePattern>> {
        let matching: Vec<AttributePattern> = self
            .patterns
            .iter()
            .filter(|p| p.variable() == name)
            .cloned()
            .collect();
        if matching.is_empty() {
            self.inner.find_unknowns(name)
        } else {
            Some(matching)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn empty_resolves_nothing() {
        assert_eq!(EmptyActivation.resolve_name("x"), None);
    }

    #[test]
    fn map_bindings_resolve() {
        let act = MapActivation::new().bind("x", 42i64).bind("s", "hi");
        assert_eq!(act.resolve_name("x"), Some(Value::Int(42)));
        assert_eq!(act.resolve_name("s"), Some(Value::string("hi")));
        assert_eq!(act.resolve_name("missing"), None);
    }

    #[test]
    fn lazy_binding_runs_once_and_memoizes() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let act = MapActivation::new().bind_lazy("x", move || {
            counter.set(counter.get() + 1);
            Value::Int(7)
        });
        assert_eq!(act.resolve_name("x"), Some(Value::Int(7)));
        assert_eq!(act.resolve_name("x"), Some(Value::Int(7)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn child_shadows_parent() {
        let parent = MapActivation::new().bind("x", 1i64).bind("y", 2i64);
        let child = MapActivation::new().bind("x", 10i64);
        let act = HierarchicalActivation::new(&parent, &child);
        assert_eq!(act.resolve_name("x"), Some(Value::Int(10)));
        assert_eq!(act.resolve_name("y"), Some(Value::Int(2)));
    }

    #[test]
    fn partial_reports_patterns_for_its_variables() {
        let inner = EmptyActivation;
        let act = PartialActivation::new(
            &inner,
            vec![AttributePattern::new("a").field("b")],
        );
        assert_eq!(act.find_unknowns("a").map(|p| p.len()), Some(1));
        assert_eq!(act.find_unknowns("z"), None);
    }

    #[test]
    fn partial_patterns_visible_through_hierarchy() {
        let inner = EmptyActivation;
        let partial = PartialActivation::new(&inner, vec![AttributePattern::new("a")]);
        let child = MapActivation::new().bind("x", 1i64);
        let act = HierarchicalActivation::new(&partial, &child);
        assert!(act.find_unknowns("a").is_some());
    }
}
