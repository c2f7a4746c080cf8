//! CEL Value - the evaluation-time data model for the CEL runtime.
//!
//! This crate defines the closed universe of runtime values and the metadata
//! the evaluator consults before touching them:
//!
//! - [`Value`]: the value sum type, with factory-only heap construction
//! - [`Traits`] / [`CelType`]: capability bits and named type descriptors
//! - checked arithmetic, cross-numeric equality and ordering
//! - [`UnknownSet`] / [`ErrorValue`]: the two propagating non-values
//! - [`TypeProvider`] / [`TypeAdapter`] and the default [`Registry`]
//!
//! Evaluation failures travel in-band as `Value::Error`; `Result` is used
//! only at host-facing boundaries. Everything here is immutable after
//! construction and safe to share across threads.

mod convert;
pub mod error;
mod heap;
mod provider;
mod traits;
pub mod types;
mod unknown;
mod value;

pub use error::{ErrorKind, ErrorValue};
pub use heap::Heap;
pub use provider::{Registry, TypeAdapter, TypeProvider};
pub use traits::Traits;
pub use types::CelType;
pub use unknown::UnknownSet;
pub use value::time::{format_duration, parse_duration};
pub use value::{MapKey, MapValue, StructValue, Value, ValueIterator};

// Re-exported so downstream crates share one chrono surface for time values.
pub use chrono::{DateTime, FixedOffset, TimeDelta};
