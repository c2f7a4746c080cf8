//! Per-evaluation value recording.
//!
//! An [`EvalState`] is an optional side channel mapping node id → computed
//! value. When a state is supplied to an evaluation, every node records its
//! result as it completes; combined with exhaustive planning this exposes the
//! value of every subexpression to observers, pruning, and tests.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use cel_value::Value;

/// Node id → computed value for one evaluation.
///
/// Interior mutability is confined to the evaluation that borrows the state;
/// states are not shared across concurrent evaluations.
#[derive(Debug, Default)]
pub struct EvalState {
    values: RefCell<FxHashMap<i64, Value>>,
}

impl EvalState {
    /// Empty state.
    pub fn new() -> Self {
        EvalState::default()
    }

    /// Record the result of a node. Re-evaluated nodes (comprehension
    /// bodies) keep their latest value.
    pub fn record(&self, id: i64, value: &Value) {
        self.values.borrow_mut().insert(id, value.clone());
    }

    /// The recorded value for a node id.
    pub fn value(&self, id: i64) -> Option<Value> {
        self.values.borrow().get(&id).cloned()
    }

    /// All recorded node ids, ascending.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.values.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop all recordings so the state can be reused.
    pub fn reset(&self) {
        self.values.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_and_read_back() {
        let state = EvalState::new();
        state.record(4, &Value::Bool(true));
        state.record(2, &Value::Int(7));
        assert_eq!(state.value(4), Some(Value::Bool(true)));
        assert_eq!(state.value(9), None);
        assert_eq!(state.ids(), vec![2, 4]);
    }

    #[test]
    fn latest_recording_wins() {
        let state = EvalState::new();
        state.record(1, &Value::Int(1));
        state.record(1, &Value::Int(2));
        assert_eq!(state.value(1), Some(Value::Int(2)));
    }

    #[test]
    fn reset_clears() {
        let state = EvalState::new();
        state.record(1, &Value::Int(1));
        state.reset();
        assert_eq!(state.value(1), None);
        assert!(state.ids().is_empty());
    }
}
