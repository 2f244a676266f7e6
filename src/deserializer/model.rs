use std::fmt;
use std::sync::Arc;

use super::Deserializer;
use crate::error::DeserializationError;
use crate::model::{Model, ModelClass, ModelContext};
use crate::value::Value;

/// Builds a nested model of one class from a map.
#[derive(Clone)]
pub struct ModelDeserializer {
    class: Arc<ModelClass>,
    ctx: ModelContext,
}

impl ModelDeserializer {
    pub const TYPE_NAME: &'static str = "ModelDeserializer";

    pub fn new(class: Arc<ModelClass>, ctx: ModelContext) -> Self {
        Self { class, ctx }
    }

    pub fn class(&self) -> &Arc<ModelClass> {
        &self.class
    }
}

impl Deserializer for ModelDeserializer {
    fn can_deserialize(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError> {
        let Value::Map(properties) = value else {
            return Err(DeserializationError::Unsupported {
                deserializer: Self::TYPE_NAME,
                found: value.kind_name(),
            });
        };
        Model::new(self.class.clone(), properties.clone(), &self.ctx)
            .map(Value::from)
            .map_err(|error| DeserializationError::Model(Box::new(error)))
    }
}

impl fmt::Debug for ModelDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelDeserializer").field(&self.class.name()).finish()
    }
}
