//! Per-model deserializer resolution.
//!
//! Every declared key is resolved exactly once, when the model is built:
//! an explicitly declared deserializer wins, then the key's own factory route,
//! then the registry default for its type. Keys left `Unavailable` are only
//! ever checked by their type definition.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::{DefinitionMap, Descriptor, TypeDefinition, TypeDefinitionInterpreter};
use crate::deserializer::Deserializer;
use crate::error::DeserializationError;
use crate::factory::DeserializerFactoryProducer;
use crate::model::ModelContext;
use crate::value::Value;

/// Terminal resolution state of one key.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Declared by the model class.
    Explicit(Arc<dyn Deserializer>),
    /// Built from the key's own type definition.
    Inferred(Arc<dyn Deserializer>),
    /// Registry default for the key's type.
    Fallback(Arc<dyn Deserializer>),
    Unavailable,
}

/// A deserializer a model class declares for a key ahead of inference.
#[derive(Debug, Clone)]
pub enum ExplicitDeserializer {
    Instance(Arc<dyn Deserializer>),
    /// Resolved like a type descriptor when the model is built.
    Descriptor(Descriptor),
}

#[derive(Debug, Clone, Default)]
pub struct DeserializerTable {
    entries: IndexMap<String, Resolution>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Resolution {
    pub fn deserializer(&self) -> Option<&Arc<dyn Deserializer>> {
        match self {
            Resolution::Explicit(d) | Resolution::Inferred(d) | Resolution::Fallback(d) => Some(d),
            Resolution::Unavailable => None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Resolution::Explicit(_) => "explicit",
            Resolution::Inferred(_) => "inferred",
            Resolution::Fallback(_) => "fallback",
            Resolution::Unavailable => "unavailable",
        }
    }

    fn resolve(definition: &TypeDefinition, ctx: &ModelContext) -> Self {
        match DeserializerFactoryProducer::from_type_definition(definition, ctx)
            .and_then(|factory| factory.deserializer())
        {
            Ok(deserializer) => Resolution::Inferred(deserializer),
            Err(error) => match ctx.registry().get_for_type_definition(definition) {
                Some(deserializer) => Resolution::Fallback(deserializer),
                None => {
                    tracing::debug!(%definition, %error, "no deserializer available");
                    Resolution::Unavailable
                }
            },
        }
    }

    fn resolve_explicit(explicit: &ExplicitDeserializer, ctx: &ModelContext) -> Self {
        let descriptor = match explicit {
            ExplicitDeserializer::Instance(deserializer) => return Resolution::Explicit(deserializer.clone()),
            ExplicitDeserializer::Descriptor(descriptor) => descriptor,
        };
        match TypeDefinitionInterpreter::new(ctx.catalog()).interpret(descriptor) {
            Ok(definition) => match Self::resolve(&definition, ctx).deserializer() {
                Some(deserializer) => Resolution::Explicit(deserializer.clone()),
                None => Resolution::Unavailable,
            },
            Err(error) => {
                tracing::warn!(%descriptor, %error, "explicit deserializer could not be interpreted");
                Resolution::Unavailable
            }
        }
    }
}

impl DeserializerTable {
    /// Resolves every declared key. Explicit entries are never overwritten.
    pub fn infer(
        definitions: &DefinitionMap,
        explicit: &IndexMap<String, ExplicitDeserializer>,
        ctx: &ModelContext,
    ) -> Self {
        let mut entries = IndexMap::with_capacity(definitions.len());
        for (key, declared) in explicit {
            entries.insert(key.clone(), Resolution::resolve_explicit(declared, ctx));
        }
        for (key, definition) in definitions {
            if entries.contains_key(key) {
                continue;
            }
            let resolution = Resolution::resolve(definition, ctx);
            tracing::debug!(key = %key, state = resolution.state_name(), "resolved deserializer");
            entries.insert(key.clone(), resolution);
        }
        Self { entries }
    }

    pub fn resolution(&self, key: &str) -> Option<&Resolution> {
        self.entries.get(key)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Deserializer>> {
        self.entries.get(key)?.deserializer()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn can_deserialize(&self, key: &str, value: &Value) -> bool {
        self.get(key).is_some_and(|d| d.can_deserialize(value))
    }

    /// Values for keys without a deserializer pass through unchanged.
    pub fn deserialize(&self, key: &str, value: &Value) -> Result<Value, DeserializationError> {
        match self.get(key) {
            Some(deserializer) => deserializer.deserialize(value),
            None => Ok(value.clone()),
        }
    }
}

/// Inference without explicit entries.
pub fn infer_deserializers(definitions: &DefinitionMap, ctx: &ModelContext) -> DeserializerTable {
    DeserializerTable::infer(definitions, &IndexMap::new(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::deserializer::PrimitiveCoercer;
    use crate::model::ModelClass;
    use crate::registry::DeserializerRegistry;

    fn ctx() -> ModelContext {
        let mut catalog = TypeCatalog::new();
        catalog.register_model(ModelClass::builder("Tag").property("label", "string").build());
        ModelContext::new(Arc::new(catalog), Arc::new(DeserializerRegistry::with_defaults()))
    }

    fn definitions(ctx: &ModelContext, entries: &[(&str, Descriptor)]) -> DefinitionMap {
        let shape = entries.iter().map(|(k, d)| (k.to_string(), d.clone())).collect();
        TypeDefinitionInterpreter::new(ctx.catalog()).create_definition_map(&shape).unwrap()
    }

    #[test]
    fn keys_resolve_to_one_terminal_state() {
        let ctx = ctx();
        let defs = definitions(&ctx, &[
            ("tag", "Tag".into()),
            ("count", "integer".into()),
            ("nothing", "null".into()),
            ("floats", Descriptor::array_of("float")),
            ("at", "DateTime".into()),
        ]);
        let table = infer_deserializers(&defs, &ctx);
        let state = |key| table.resolution(key).unwrap().state_name();
        assert_eq!(state("tag"), "inferred");
        assert_eq!(state("count"), "fallback");
        assert_eq!(state("nothing"), "unavailable");
        assert_eq!(state("floats"), "inferred");
        assert_eq!(state("at"), "fallback");
        assert!(table.resolution("missing").is_none());
    }

    #[test]
    fn explicit_entries_beat_inference() {
        let ctx = ctx();
        let defs = definitions(&ctx, &[("flag", "string".into()), ("n", "integer".into())]);
        let mut explicit = IndexMap::new();
        explicit.insert("flag".to_string(), ExplicitDeserializer::Instance(Arc::new(PrimitiveCoercer::boolean())));
        explicit.insert("n".to_string(), ExplicitDeserializer::Descriptor("FloatDeserializer".into()));
        let table = DeserializerTable::infer(&defs, &explicit, &ctx);

        assert_eq!(table.resolution("flag").unwrap().state_name(), "explicit");
        assert_eq!(table.deserialize("flag", &Value::from("yes")).unwrap(), Value::Bool(true));
        assert_eq!(table.deserialize("n", &Value::from("2")).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn missing_deserializers_pass_values_through() {
        let ctx = ctx();
        let defs = definitions(&ctx, &[("nothing", "null".into())]);
        let table = infer_deserializers(&defs, &ctx);
        assert!(!table.can_deserialize("nothing", &Value::from("x")));
        assert!(!table.can_deserialize("unknown", &Value::from("x")));
        assert_eq!(table.deserialize("nothing", &Value::from("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn empty_registry_leaves_primitives_unavailable() {
        let ctx = ModelContext::new(Arc::new(TypeCatalog::new()), Arc::new(DeserializerRegistry::new()));
        let defs = definitions(&ctx, &[("count", "integer".into())]);
        let table = infer_deserializers(&defs, &ctx);
        assert!(matches!(table.resolution("count"), Some(Resolution::Unavailable)));
    }
}
