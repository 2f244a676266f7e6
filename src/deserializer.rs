//! Deserializer strategies.
//!
//! One strategy per target shape. `can_deserialize` is a side-effect-free
//! predicate; `deserialize` performs the conversion and fails when the
//! predicate would have rejected the value (array inputs excepted, see
//! [`ArrayDeserializer`]).
pub mod array;
pub mod date_time;
pub mod model;
pub mod scalar;

use std::fmt;

use crate::error::DeserializationError;
use crate::value::Value;

pub use array::ArrayDeserializer;
pub use date_time::DateTimeDeserializer;
pub use model::ModelDeserializer;
pub use scalar::{JuggleCoercer, PrimitiveCoercer, ScalarKind};

pub trait Deserializer: Send + Sync + fmt::Debug {
    fn can_deserialize(&self, value: &Value) -> bool;
    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError>;
}
