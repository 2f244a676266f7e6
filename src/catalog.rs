//! Registry of constructible types.
//!
//! Stands in for runtime reflection: every class a shape may name is
//! registered here together with how to build or recognise it.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::{ClassKind, InstanceCheck};
use crate::deserializer::{ArrayDeserializer, DateTimeDeserializer, Deserializer, JuggleCoercer, ModelDeserializer, PrimitiveCoercer};
use crate::model::ModelClass;
use crate::value::Value;

/// Name under which date/time values are known.
pub const DATE_TIME: &str = "DateTime";

/// The introspection queries deserializer resolution relies on.
pub trait TypeOracle {
    fn type_exists(&self, name: &str) -> bool;
    fn is_model(&self, name: &str) -> bool;
    fn is_deserializer(&self, name: &str) -> bool;
    /// True when the type cannot be built without arguments.
    fn has_dependencies(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub enum DeserializerConstructor {
    NoArgs(fn() -> Arc<dyn Deserializer>),
    WithDependencies,
}

#[derive(Debug, Clone)]
enum TypeEntry {
    Model(Arc<ModelClass>),
    Deserializer(DeserializerConstructor),
    Value(InstanceCheck),
}

#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: IndexMap<String, TypeEntry>,
}

impl TypeCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with the built-in value and deserializer classes.
    ///
    /// - `DateTime`
    /// - `BooleanDeserializer` `IntegerDeserializer` `FloatDeserializer`
    ///   `StringDeserializer` `DateTimeDeserializer`
    /// - `ArrayDeserializer` `ModelDeserializer` (need arguments, so they can
    ///   never be built by name)
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register_value_class(DATE_TIME, |v| matches!(v, Value::DateTime(_)));
        catalog.register_deserializer_with(
            "BooleanDeserializer",
            DeserializerConstructor::NoArgs(|| -> Arc<dyn Deserializer> { Arc::new(PrimitiveCoercer::boolean()) }),
        );
        catalog.register_deserializer_with(
            "IntegerDeserializer",
            DeserializerConstructor::NoArgs(|| -> Arc<dyn Deserializer> { Arc::new(PrimitiveCoercer::integer()) }),
        );
        catalog.register_deserializer_with(
            "FloatDeserializer",
            DeserializerConstructor::NoArgs(|| -> Arc<dyn Deserializer> { Arc::new(PrimitiveCoercer::float()) }),
        );
        catalog.register_deserializer_with(
            "StringDeserializer",
            DeserializerConstructor::NoArgs(|| -> Arc<dyn Deserializer> { Arc::new(PrimitiveCoercer::string()) }),
        );
        catalog.register_deserializer::<DateTimeDeserializer>("DateTimeDeserializer");
        catalog.register_deserializer_with(ArrayDeserializer::TYPE_NAME, DeserializerConstructor::WithDependencies);
        catalog.register_deserializer_with(ModelDeserializer::TYPE_NAME, DeserializerConstructor::WithDependencies);
        catalog.register_deserializer_with(JuggleCoercer::TYPE_NAME, DeserializerConstructor::WithDependencies);
        catalog
    }

    /// Registers (or replaces) a model class under its own name.
    pub fn register_model(&mut self, class: ModelClass) -> Arc<ModelClass> {
        let class = Arc::new(class);
        self.insert(class.name().to_string(), TypeEntry::Model(class.clone()));
        class
    }

    /// Registers a deserializer class that builds with `Default`.
    pub fn register_deserializer<T>(&mut self, name: &str)
    where
        T: Deserializer + Default + 'static,
    {
        self.register_deserializer_with(name, DeserializerConstructor::NoArgs(construct_default::<T>));
    }

    pub fn register_deserializer_with(&mut self, name: &str, constructor: DeserializerConstructor) {
        self.insert(name.to_string(), TypeEntry::Deserializer(constructor));
    }

    pub fn register_value_class(&mut self, name: &str, is_instance: InstanceCheck) {
        self.insert(name.to_string(), TypeEntry::Value(is_instance));
    }

    pub fn model(&self, name: &str) -> Option<&Arc<ModelClass>> {
        match self.types.get(name)? {
            TypeEntry::Model(class) => Some(class),
            _ => None,
        }
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelClass>> {
        self.types.values().filter_map(|entry| match entry {
            TypeEntry::Model(class) => Some(class),
            _ => None,
        })
    }

    pub fn constructor(&self, name: &str) -> Option<DeserializerConstructor> {
        match self.types.get(name)? {
            TypeEntry::Deserializer(constructor) => Some(*constructor),
            _ => None,
        }
    }

    pub fn class_kind(&self, name: &str) -> Option<ClassKind> {
        Some(match self.types.get(name)? {
            TypeEntry::Model(_) => ClassKind::Model,
            TypeEntry::Deserializer(_) => ClassKind::Deserializer,
            TypeEntry::Value(check) => ClassKind::Value(*check),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    fn insert(&mut self, name: String, entry: TypeEntry) {
        if self.types.insert(name.clone(), entry).is_some() {
            tracing::debug!(name = %name, "replaced catalog entry");
        }
    }
}

impl TypeOracle for TypeCatalog {
    fn type_exists(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn is_model(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(TypeEntry::Model(_)))
    }

    fn is_deserializer(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(TypeEntry::Deserializer(_)))
    }

    fn has_dependencies(&self, name: &str) -> bool {
        !matches!(self.constructor(name), Some(DeserializerConstructor::NoArgs(_)))
    }
}

fn construct_default<T: Deserializer + Default + 'static>() -> Arc<dyn Deserializer> {
    Arc::new(T::default())
}
