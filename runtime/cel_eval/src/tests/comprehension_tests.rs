//! Comprehension fold invariants.

use cel_ir::{ComprehensionExpr, Constant, EntryExpr, Expr};
use cel_value::Value;
use pretty_assertions::assert_eq;

use crate::operators;

use super::{
    all_macro, eval_empty, exists_macro, exists_one_macro, filter_macro, int_list, map_macro,
    Ids, ACCU_VAR,
};

#[test]
fn all_fails_on_counterexample() {
    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[2, 3, 4]);
    let predicate = Expr::call(
        ids.id(),
        operators::EQUALS,
        vec![
            Expr::call(
                ids.id(),
                operators::MODULO,
                vec![
                    Expr::ident(ids.id(), "x"),
                    Expr::literal(ids.id(), Constant::Int(2)),
                ],
            ),
            Expr::literal(ids.id(), Constant::Int(0)),
        ],
    );
    let expr = all_macro(&mut ids, range, "x", predicate);
    assert_eq!(eval_empty(&expr), Value::Bool(false));
}

#[test]
fn map_transforms_in_iteration_order() {
    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[1, 2, 3]);
    let transform = Expr::call(
        ids.id(),
        operators::MULTIPLY,
        vec![
            Expr::ident(ids.id(), "x"),
            Expr::literal(ids.id(), Constant::Int(2)),
        ],
    );
    let expr = map_macro(&mut ids, range, "x", transform);
    assert_eq!(
        eval_empty(&expr),
        Value::list(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
    );
}

#[test]
fn filter_keeps_matching_elements() {
    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[1, 2, 3, 4]);
    let predicate = Expr::call(
        ids.id(),
        operators::GREATER,
        vec![
            Expr::ident(ids.id(), "x"),
            Expr::literal(ids.id(), Constant::Int(2)),
        ],
    );
    let expr = filter_macro(&mut ids, range, "x", predicate);
    assert_eq!(
        eval_empty(&expr),
        Value::list(vec![Value::Int(3), Value::Int(4)])
    );
}

#[test]
fn exists_one_counts_matches() {
    for (values, expected) in [
        (&[1_i64, 2, 3][..], true),
        (&[2, 2, 3][..], false),
        (&[1, 3, 5][..], false),
    ] {
        let mut ids = Ids::new();
        let range = int_list(&mut ids, values);
        let predicate = Expr::call(
            ids.id(),
            operators::EQUALS,
            vec![
                Expr::call(
                    ids.id(),
                    operators::MODULO,
                    vec![
                        Expr::ident(ids.id(), "x"),
                        Expr::literal(ids.id(), Constant::Int(2)),
                    ],
                ),
                Expr::literal(ids.id(), Constant::Int(0)),
            ],
        );
        let expr = exists_one_macro(&mut ids, range, "x", predicate);
        assert_eq!(eval_empty(&expr), Value::Bool(expected), "over {values:?}");
    }
}

#[test]
fn nested_comprehension_shadows_outer_iter_var() {
    // [1, 2].exists(x, [10, 20].exists(x, x == 20))
    // The inner x shadows the outer one, so the inner predicate sees the
    // inner elements only.
    let mut ids = Ids::new();
    let inner_range = int_list(&mut ids, &[10, 20]);
    let inner_pred = Expr::call(
        ids.id(),
        operators::EQUALS,
        vec![
            Expr::ident(ids.id(), "x"),
            Expr::literal(ids.id(), Constant::Int(20)),
        ],
    );
    let inner = exists_macro(&mut ids, inner_range, "x", inner_pred);
    let outer_range = int_list(&mut ids, &[1, 2]);
    let expr = exists_macro(&mut ids, outer_range, "x", inner);
    assert_eq!(eval_empty(&expr), Value::Bool(true));
}

#[test]
fn iter_range_is_evaluated_exactly_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::dispatcher::Overload;
    use crate::interpreter::Interpreter;

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let interpreter = Interpreter::builder()
        .add_overloads([Overload::zero("test_range", "test_range", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        })])
        .build()
        .unwrap();

    let mut ids = Ids::new();
    let range = Expr::call(ids.id(), "test_range", vec![]);
    let predicate = Expr::call(
        ids.id(),
        operators::GREATER,
        vec![
            Expr::ident(ids.id(), "x"),
            Expr::literal(ids.id(), Constant::Int(0)),
        ],
    );
    let expr = exists_macro(&mut ids, range, "x", predicate);
    let planned = interpreter.plan(&expr).unwrap();
    assert_eq!(
        planned.eval(&crate::activation::EmptyActivation),
        Value::Bool(true)
    );
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn accumulator_last_assignment_reaches_result() {
    // A raw fold that sums elements: init 0, step accu + x, result accu.
    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[1, 2, 3]);
    let step = Expr::call(
        ids.id(),
        operators::ADD,
        vec![Expr::ident(ids.id(), ACCU_VAR), Expr::ident(ids.id(), "x")],
    );
    let expr = Expr::comprehension(
        ids.id(),
        ComprehensionExpr {
            iter_var: "x".to_string(),
            iter_range: range,
            accu_var: ACCU_VAR.to_string(),
            accu_init: Expr::literal(ids.id(), Constant::Int(0)),
            loop_cond: Expr::literal(ids.id(), Constant::Bool(true)),
            loop_step: step,
            result: Expr::ident(ids.id(), ACCU_VAR),
        },
    );
    assert_eq!(eval_empty(&expr), Value::Int(6));
}

#[test]
fn map_iteration_folds_over_keys() {
    let mut ids = Ids::new();
    let range = Expr::map(
        ids.id(),
        vec![
            EntryExpr::new(
                ids.id(),
                Expr::literal(ids.id(), Constant::String("a".to_string())),
                Expr::literal(ids.id(), Constant::Int(1)),
            ),
            EntryExpr::new(
                ids.id(),
                Expr::literal(ids.id(), Constant::String("b".to_string())),
                Expr::literal(ids.id(), Constant::Int(2)),
            ),
        ],
    );
    let predicate = Expr::call(
        ids.id(),
        operators::EQUALS,
        vec![
            Expr::ident(ids.id(), "k"),
            Expr::literal(ids.id(), Constant::String("b".to_string())),
        ],
    );
    let expr = exists_macro(&mut ids, range, "k", predicate);
    assert_eq!(eval_empty(&expr), Value::Bool(true));
}

#[test]
fn non_iterable_range_errors() {
    let mut ids = Ids::new();
    let range = Expr::literal(ids.id(), Constant::Int(5));
    let predicate = Expr::literal(ids.id(), Constant::Bool(true));
    let expr = exists_macro(&mut ids, range, "x", predicate);
    assert!(eval_empty(&expr).is_error());
}

#[test]
fn empty_range_yields_init_result() {
    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[]);
    let predicate = Expr::literal(ids.id(), Constant::Bool(true));
    let exists = exists_macro(&mut ids, range, "x", predicate);
    assert_eq!(eval_empty(&exists), Value::Bool(false));

    let mut ids = Ids::new();
    let range = int_list(&mut ids, &[]);
    let predicate = Expr::literal(ids.id(), Constant::Bool(false));
    let all = all_macro(&mut ids, range, "x", predicate);
    assert_eq!(eval_empty(&all), Value::Bool(true));
}
