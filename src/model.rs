//! Typed model instances.
//!
//! A [`Model`] is a bag of properties constrained by its [`ModelClass`]:
//! only declared keys may be set, and every value must pass the key's type
//! definition, optionally after being coerced by the key's deserializer.
pub mod class;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::TypeCatalog;
use crate::definition::{DefinitionMap, Descriptor};
use crate::error::{DeserializationError, ModelError};
use crate::properties::DeserializerTable;
use crate::registry::DeserializerRegistry;
use crate::value::Value;

pub use class::{ModelClass, ModelClassBuilder};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Everything hydration resolves against: the known types and the fallback
/// deserializers.
#[derive(Debug, Clone)]
pub struct ModelContext {
    catalog: Arc<TypeCatalog>,
    registry: Arc<DeserializerRegistry>,
}

#[derive(Debug, Clone)]
pub struct Model {
    class: Arc<ModelClass>,
    definitions: Arc<DefinitionMap>,
    deserializers: DeserializerTable,
    properties: IndexMap<String, Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

impl ModelContext {
    pub fn new(catalog: Arc<TypeCatalog>, registry: Arc<DeserializerRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// Resolves against the process-wide registry.
    pub fn global(catalog: Arc<TypeCatalog>) -> Self {
        Self::new(catalog, DeserializerRegistry::global())
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &DeserializerRegistry {
        &self.registry
    }

    pub fn model_class(&self, name: &str) -> Result<&Arc<ModelClass>, ModelError> {
        self.catalog
            .model(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    /// Hydrates the model class registered under `name`.
    pub fn model(&self, name: &str, json: serde_json::Value) -> Result<Model, ModelError> {
        let class = self.model_class(name)?.clone();
        Model::from_json(class, json, self)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MODEL
// ————————————————————————————————————————————————————————————————————————————

impl Model {
    pub fn new(
        class: Arc<ModelClass>,
        properties: IndexMap<String, Value>,
        ctx: &ModelContext,
    ) -> Result<Self, ModelError> {
        let missing = class.missing_mandatory(properties.keys());
        if !missing.is_empty() {
            return Err(ModelError::MissingMandatory {
                model: class.name().to_string(),
                missing,
            });
        }
        let definitions = class
            .definitions(ctx.catalog())
            .map_err(|source| ModelError::Definition {
                model: class.name().to_string(),
                source,
            })?;
        let deserializers = if class.coerces() {
            DeserializerTable::infer(&definitions, class.explicit_deserializers(), ctx)
        } else {
            DeserializerTable::default()
        };
        let mut model = Self {
            class,
            definitions,
            deserializers,
            properties: IndexMap::new(),
        };
        model.hydrate(properties)?;
        model.add_defaults();
        Ok(model)
    }

    /// Top-level input must be a JSON object.
    pub fn from_json(
        class: Arc<ModelClass>,
        json: serde_json::Value,
        ctx: &ModelContext,
    ) -> Result<Self, ModelError> {
        match Value::from(json) {
            Value::Map(properties) => Self::new(class, properties, ctx),
            other => Err(ModelError::NotAnObject(other.kind_name())),
        }
    }

    /// Mass assignment, subject to the class's fillable/guarded lists.
    pub fn hydrate(&mut self, properties: IndexMap<String, Value>) -> Result<(), ModelError> {
        for (key, value) in properties {
            if !self.class.can_hydrate(&key) {
                tracing::debug!(model = self.class.name(), key = %key, "skipping guarded property");
                continue;
            }
            self.set(&key, value)?;
        }
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let mut value = value.into();
        if !self.is_property_known(key) {
            if self.class.throws_on_unknown() {
                return Err(ModelError::UnknownProperty(key.to_string()));
            }
            tracing::warn!(model = self.class.name(), key, "ignoring unknown property");
            return Ok(());
        }
        if self.deserializers.can_deserialize(key, &value) {
            value = self.deserializers.deserialize(key, &value).map_err(|error| match error {
                DeserializationError::Model(inner) => *inner,
                source => ModelError::Deserialization {
                    key: key.to_string(),
                    source,
                },
            })?;
        }
        if !self.can_assign_value(key, &value) {
            let expected = self
                .definitions
                .get(key)
                .map(|definition| definition.canonical_form().to_string())
                .unwrap_or_default();
            return Err(ModelError::InvalidValue {
                key: key.to_string(),
                expected,
            });
        }
        self.properties.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Value, ModelError> {
        self.properties
            .get(key)
            .ok_or_else(|| ModelError::PropertyNotFound(key.to_string()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_property_known(&self, key: &str) -> bool {
        self.class.is_property_known(key)
    }

    pub fn can_assign_value(&self, key: &str, value: &Value) -> bool {
        match self.definitions.get(key) {
            Some(definition) => definition.validate(value) || self.deserializers.can_deserialize(key, value),
            None => false,
        }
    }

    pub fn can_deserialize(&self, key: &str, value: &Value) -> bool {
        self.deserializers.can_deserialize(key, value)
    }

    pub fn deserialize(&self, key: &str, value: &Value) -> Result<Value, DeserializationError> {
        self.deserializers.deserialize(key, value)
    }

    /// Fills every unset declared key with its type's default. Set keys are
    /// left alone.
    pub fn add_defaults(&mut self) {
        for (key, definition) in self.definitions.iter() {
            if !self.properties.contains_key(key) {
                self.properties.insert(key.clone(), definition.default_value());
            }
        }
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn into_properties(self) -> IndexMap<String, Value> {
        self.properties
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn class(&self) -> &Arc<ModelClass> {
        &self.class
    }

    pub fn type_definitions(&self) -> &DefinitionMap {
        &self.definitions
    }

    pub fn deserializers(&self) -> &DeserializerTable {
        &self.deserializers
    }

    pub fn structure(&self) -> &IndexMap<String, Descriptor> {
        self.class.structure()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.properties
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name() && self.properties == other.properties
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for (key, value) in &self.properties {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---- Tests ---- //
