use std::sync::Arc;

use indexmap::IndexMap;

use super::Deserializer;
use crate::error::DeserializationError;
use crate::value::Value;

/// Applies an element deserializer to every item of a list or map.
///
/// `can_deserialize` is strict, but `deserialize` on a non-sequence returns an
/// empty list instead of failing.
#[derive(Debug, Clone)]
pub struct ArrayDeserializer {
    element: Arc<dyn Deserializer>,
}

impl ArrayDeserializer {
    pub const TYPE_NAME: &'static str = "ArrayDeserializer";

    pub fn new(element: Arc<dyn Deserializer>) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Arc<dyn Deserializer> {
        &self.element
    }

    fn item(&self, value: &Value) -> Result<Value, DeserializationError> {
        if !self.element.can_deserialize(value) {
            return Err(DeserializationError::InvalidItems);
        }
        self.element.deserialize(value)
    }
}

impl Deserializer for ArrayDeserializer {
    fn can_deserialize(&self, value: &Value) -> bool {
        match value.elements() {
            Some(mut items) => items.all(|item| self.element.can_deserialize(item)),
            None => false,
        }
    }

    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| self.item(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.item(item)?)))
                .collect::<Result<IndexMap<_, _>, DeserializationError>>()
                .map(Value::Map),
            other => {
                tracing::warn!(found = other.kind_name(), "array deserializer given a non-sequence, yielding []");
                Ok(Value::List(Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::PrimitiveCoercer;
    use serde_json::json;

    fn floats() -> ArrayDeserializer {
        ArrayDeserializer::new(Arc::new(PrimitiveCoercer::float()))
    }

    #[test]
    fn can_deserialize_checks_every_element() {
        let d = floats();
        for ok in [json!([]), json!(["1"]), json!([1]), json!([1, 2]), json!([1, 2, 3])] {
            assert!(d.can_deserialize(&Value::from(ok)));
        }
        for bad in [json!(["test"]), json!("string"), json!(1), json!([[]]), json!([[1]]), json!([["string"]])] {
            assert!(!d.can_deserialize(&Value::from(bad)));
        }
    }

    #[test]
    fn deserializes_each_element() {
        let d = floats();
        assert_eq!(d.deserialize(&Value::from(json!([1]))).unwrap(), Value::from(vec![1.0]));
        assert_eq!(d.deserialize(&Value::from(json!(["1"]))).unwrap(), Value::from(vec![1.0]));
    }

    #[test]
    fn map_keys_are_preserved() {
        let d = floats();
        let out = d.deserialize(&Value::from(json!({"b": "2.5", "a": 1}))).unwrap();
        assert_eq!(out.to_json(), json!({"b": 2.5, "a": 1.0}));
    }

    #[test]
    fn non_sequences_become_empty() {
        let d = floats();
        for input in [json!(1), json!("so i was walking down the park one day"), json!(null)] {
            assert_eq!(d.deserialize(&Value::from(input)).unwrap(), Value::List(Vec::new()));
        }
    }

    #[test]
    fn invalid_items_fail() {
        let d = floats();
        assert!(matches!(
            d.deserialize(&Value::from(json!([[1]]))),
            Err(DeserializationError::InvalidItems)
        ));
    }
}
