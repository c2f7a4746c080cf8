//! Late-binding: overlays, aggregation precedence, decoration, validation.

use std::sync::Arc;

use cel_ir::{Constant, Expr};
use cel_value::{Traits, Value};
use pretty_assertions::assert_eq;

use crate::activation::{Activation, EmptyActivation, HierarchicalActivation, MapActivation};
use crate::dispatcher::{DispatchError, Dispatcher, Overload};
use crate::interpreter::{Interpreter, Program};
use crate::late::{validate_overlays, LateBindActivation};

fn upper(v: Value) -> Value {
    match v.as_str() {
        Some(s) => Value::string(s.to_uppercase()),
        None => v,
    }
}

fn f_string(result: &'static str) -> Overload {
    Overload::unary("f_string", "f", move |_| Value::string(result))
        .with_arg_types(vec![cel_value::types::string_type().clone()])
}

fn overlay(overloads: impl IntoIterator<Item = Overload>) -> Arc<Dispatcher> {
    let mut d = Dispatcher::new();
    d.add(overloads).unwrap();
    Arc::new(d)
}

/// Interpreter with the static `f_string` overload and late binding on.
fn f_program() -> Program {
    let interpreter = Interpreter::builder()
        .add_overloads([f_string("F")])
        .late_binding(true)
        .build()
        .unwrap();
    let expr = Expr::call(
        2,
        "f",
        vec![Expr::literal(1, Constant::String("hi".to_string()))],
    );
    interpreter.plan(&expr).unwrap()
}

#[test]
fn overlay_overrides_static_overload() {
    let planned = f_program();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([Overload::unary("f_string", "f", upper)]),
    );
    assert_eq!(planned.eval(&late), Value::string("HI"));
}

#[test]
fn empty_overlay_preserves_semantics() {
    let planned = f_program();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(&inner, Arc::new(Dispatcher::new()));
    assert_eq!(planned.eval(&late), Value::string("F"));
    // Without any late-bind activation the decorated plan behaves as
    // planned too.
    assert_eq!(planned.eval(&EmptyActivation), Value::string("F"));
}

#[test]
fn plan_is_unchanged_after_override() {
    let planned = f_program();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([Overload::unary("f_string", "f", upper)]),
    );
    assert_eq!(planned.eval(&late), Value::string("HI"));
    // The proxy built a throwaway node; the planned graph still carries the
    // static implementation.
    assert_eq!(planned.eval(&EmptyActivation), Value::string("F"));
}

#[test]
fn outer_overlay_wins_over_inner() {
    let planned = f_program();
    let inner_most = EmptyActivation;
    let inner = LateBindActivation::new(
        &inner_most,
        overlay([Overload::unary("f_string", "f", |_| Value::string("inner"))]),
    );
    let outer = LateBindActivation::new(
        &inner,
        overlay([Overload::unary("f_string", "f", |_| Value::string("outer"))]),
    );
    assert_eq!(planned.eval(&outer), Value::string("outer"));

    let aggregated = outer.resolve_overloads();
    let kept = aggregated.find_overload("f_string").unwrap();
    assert_eq!(kept.invoke(&[Value::Null]), Value::string("outer"));
}

#[test]
fn hierarchical_child_overlay_wins_over_parent() {
    let base = EmptyActivation;
    let parent = LateBindActivation::new(
        &base,
        overlay([Overload::unary("f_string", "f", |_| Value::string("parent"))]),
    );
    let base2 = EmptyActivation;
    let child = LateBindActivation::new(
        &base2,
        overlay([Overload::unary("f_string", "f", |_| Value::string("child"))]),
    );
    let hierarchy = HierarchicalActivation::new(&parent, &child);
    let resolved = hierarchy.resolve_overload("f_string").unwrap();
    assert_eq!(resolved.invoke(&[Value::Null]), Value::string("child"));
}

#[test]
fn overlay_reaches_calls_nested_in_logic() {
    // f("hi") == "HI" only when the overlay rewrites f; the equality node is
    // visited transitively by the decorator.
    let interpreter = Interpreter::builder()
        .add_overloads([f_string("F")])
        .late_binding(true)
        .build()
        .unwrap();
    let expr = Expr::call(
        4,
        crate::operators::EQUALS,
        vec![
            Expr::call(
                2,
                "f",
                vec![Expr::literal(1, Constant::String("hi".to_string()))],
            ),
            Expr::literal(3, Constant::String("HI".to_string())),
        ],
    );
    let planned = interpreter.plan(&expr).unwrap();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([Overload::unary("f_string", "f", upper)]),
    );
    assert_eq!(planned.eval(&late), Value::Bool(true));
    assert_eq!(planned.eval(&EmptyActivation), Value::Bool(false));
}

#[test]
fn overlay_applies_under_map_activation_parent() {
    // Name resolution and overlay resolution coexist: the overlay wraps a
    // map activation whose bindings stay visible.
    let interpreter = Interpreter::builder()
        .add_overloads([f_string("F")])
        .late_binding(true)
        .build()
        .unwrap();
    let expr = Expr::call(2, "f", vec![Expr::ident(1, "s")]);
    let planned = interpreter.plan(&expr).unwrap();
    let names = MapActivation::new().bind("s", "hi");
    let late = LateBindActivation::new(
        &names,
        overlay([Overload::unary("f_string", "f", upper)]),
    );
    assert_eq!(planned.eval(&late), Value::string("HI"));
}

#[test]
fn validation_accepts_identical_signatures() {
    let mut reference = Dispatcher::new();
    reference.add([f_string("F")]).unwrap();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(&inner, overlay([f_string("other")]));
    assert!(validate_overlays(&late, &reference).is_ok());
}

#[test]
fn validation_rejects_arity_mismatch() {
    let mut reference = Dispatcher::new();
    reference.add([f_string("F")]).unwrap();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([Overload::binary("f_string", "f", |l, _| l)]),
    );
    match validate_overlays(&late, &reference) {
        Err(DispatchError::InvalidSignature { id, .. }) => assert_eq!(id, "f_string"),
        other => panic!("expected invalid signature, got {other:?}"),
    }
}

#[test]
fn validation_rejects_operand_trait_mismatch() {
    let mut reference = Dispatcher::new();
    reference.add([f_string("F")]).unwrap();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([
            Overload::unary("f_string", "f", upper).with_operand_trait(Traits::SIZER)
        ]),
    );
    match validate_overlays(&late, &reference) {
        Err(DispatchError::MismatchedAttribute { id, .. }) => assert_eq!(id, "f_string"),
        other => panic!("expected mismatched attribute, got {other:?}"),
    }
}

#[test]
fn validation_rejects_strictness_mismatch() {
    let mut reference = Dispatcher::new();
    reference.add([f_string("F")]).unwrap();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(
        &inner,
        overlay([Overload::unary("f_string", "f", upper).non_strict()]),
    );
    assert!(matches!(
        validate_overlays(&late, &reference),
        Err(DispatchError::InvalidSignature { .. })
    ));
}

#[test]
fn validation_ignores_ids_absent_from_reference() {
    let reference = Dispatcher::new();
    let inner = EmptyActivation;
    let late = LateBindActivation::new(&inner, overlay([f_string("whatever")]));
    assert!(validate_overlays(&late, &reference).is_ok());
}
