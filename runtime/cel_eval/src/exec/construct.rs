//! List, map, and object construction.
//!
//! Children evaluate left-to-right and all of them evaluate even when one
//! fails; the first unknown (or, failing that, the first error) propagates.
//! Optional elements and entries contribute their inner value when present
//! and vanish when empty.

use rustc_hash::FxHashMap;

use cel_value::error as err;
use cel_value::{MapKey, Value};

use super::{tag_error, EvalCtx, EvalNode};

use std::sync::Arc;

/// A planned map entry.
#[derive(Debug)]
pub struct EntryNode {
    /// Node id of the entry.
    pub id: i64,
    pub key: Arc<EvalNode>,
    pub value: Arc<EvalNode>,
    /// Skip the entry when the value is an empty optional.
    pub optional: bool,
}

/// A planned object field initializer.
#[derive(Debug)]
pub struct FieldNode {
    /// Node id of the initializer.
    pub id: i64,
    pub field: String,
    pub value: Arc<EvalNode>,
    /// Skip the field when the value is an empty optional.
    pub optional: bool,
}

/// Tracks the first unknown and first error seen while children evaluate.
#[derive(Default)]
struct Propagation {
    first_unknown: Option<Value>,
    first_error: Option<Value>,
}

impl Propagation {
    fn observe(&mut self, value: &Value) -> bool {
        if value.is_unknown() {
            if self.first_unknown.is_none() {
                self.first_unknown = Some(value.clone());
            }
            true
        } else if value.is_error() {
            if self.first_error.is_none() {
                self.first_error = Some(value.clone());
            }
            true
        } else {
            false
        }
    }

    /// The value to propagate: unknowns beat errors, first encountered wins.
    fn failing(self) -> Option<Value> {
        self.first_unknown.or(self.first_error)
    }
}

/// Unwrap an optional construction child: `Ok(Some(v))` to include,
/// `Ok(None)` to skip, `Err(e)` when the value is not an optional at all.
fn unwrap_optional(value: Value, id: i64) -> Result<Option<Value>, Value> {
    match value {
        Value::Optional(inner) => Ok((*inner).clone()),
        other => Err(tag_error(
            Value::error(err::ErrorValue::new(
                err::ErrorKind::TypeConversion,
                format!("optional entry has type {}", other.type_name()),
            )),
            id,
        )),
    }
}

/// `[e0, e1, …]` with optional-element skipping.
pub fn eval_list(
    _id: i64,
    elements: &[Arc<EvalNode>],
    optional_indices: &[usize],
    ctx: &EvalCtx,
) -> Value {
    let mut items = Vec::with_capacity(elements.len());
    let mut propagation = Propagation::default();
    for (index, element) in elements.iter().enumerate() {
        let value = element.eval(ctx);
        if propagation.observe(&value) {
            continue;
        }
        if optional_indices.contains(&index) {
            match unwrap_optional(value, element.id()) {
                Ok(Some(inner)) => items.push(inner),
                Ok(None) => {}
                Err(failure) => {
                    propagation.observe(&failure);
                }
            }
        } else {
            items.push(value);
        }
    }
    match propagation.failing() {
        Some(failing) => failing,
        None => Value::list(items),
    }
}

/// `{k: v, …}` with optional-entry skipping; duplicate keys keep the last
/// written value.
pub fn eval_map(_id: i64, entries: &[EntryNode], ctx: &EvalCtx) -> Value {
    let mut pairs: Vec<(MapKey, Value)> = Vec::with_capacity(entries.len());
    let mut propagation = Propagation::default();
    for entry in entries {
        let key = entry.key.eval(ctx);
        if propagation.observe(&key) {
            // The value side still evaluates for state recording.
            let value = entry.value.eval(ctx);
            propagation.observe(&value);
            continue;
        }
        let value = entry.value.eval(ctx);
        if propagation.observe(&value) {
            continue;
        }
        let map_key = match MapKey::from_value(&key) {
            Ok(k) => k,
            Err(e) => {
                propagation.observe(&tag_error(Value::error(e), entry.key.id()));
                continue;
            }
        };
        if entry.optional {
            match unwrap_optional(value, entry.value.id()) {
                Ok(Some(inner)) => pairs.push((map_key, inner)),
                Ok(None) => {}
                Err(failure) => {
                    propagation.observe(&failure);
                }
            }
        } else {
            pairs.push((map_key, value));
        }
    }
    match propagation.failing() {
        Some(failing) => failing,
        None => Value::map(pairs),
    }
}

/// `Type{field: value, …}` through the type provider.
pub fn eval_struct(id: i64, type_name: &str, fields: &[FieldNode], ctx: &EvalCtx) -> Value {
    let mut field_map = FxHashMap::default();
    let mut propagation = Propagation::default();
    for field in fields {
        let value = field.value.eval(ctx);
        if propagation.observe(&value) {
            continue;
        }
        if field.optional {
            match unwrap_optional(value, field.value.id()) {
                Ok(Some(inner)) => {
                    field_map.insert(field.field.clone(), inner);
                }
                Ok(None) => {}
                Err(failure) => {
                    propagation.observe(&failure);
                }
            }
        } else {
            field_map.insert(field.field.clone(), value);
        }
    }
    match propagation.failing() {
        Some(failing) => failing,
        None => tag_error(ctx.provider.new_value(type_name, field_map), id),
    }
}
