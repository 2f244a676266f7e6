//! Process-wide fallback deserializers.
//!
//! Maps a canonical type key (a primitive kind or a class name) to a default
//! deserializer. Meant to be filled once at startup and read afterwards; the
//! table sits behind a read-write lock so late registration stays sound.
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::catalog::{DATE_TIME, TypeCatalog};
use crate::definition::{Descriptor, TypeDefinition};
use crate::deserializer::{DateTimeDeserializer, Deserializer, PrimitiveCoercer, ScalarKind};
use crate::error::DeserializerInitError;
use crate::factory::{DeserializerFactory, TypeDeserializerFactory};

static GLOBAL: Lazy<Arc<DeserializerRegistry>> = Lazy::new(|| Arc::new(DeserializerRegistry::new()));

#[derive(Debug, Default)]
pub struct DeserializerRegistry {
    table: RwLock<HashMap<String, Arc<dyn Deserializer>>>,
}

impl DeserializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A private registry with the defaults already registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// The process-wide registry. Empty until a host calls
    /// [`register_defaults`](Self::register_defaults) on it.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    pub fn add(&self, key: impl Into<String>, deserializer: Arc<dyn Deserializer>) {
        let key = key.into();
        tracing::debug!(key = %key, deserializer = ?deserializer, "registering global deserializer");
        self.table.write().insert(key, deserializer);
    }

    /// Registers a deserializer class by name; it must build without arguments.
    pub fn add_type(
        &self,
        key: impl Into<String>,
        type_name: &str,
        catalog: &TypeCatalog,
    ) -> Result<(), DeserializerInitError> {
        let deserializer = TypeDeserializerFactory::new(type_name, catalog)?.deserializer()?;
        self.add(key, deserializer);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Deserializer>> {
        self.table.read().get(key).cloned()
    }

    /// Arrays have no canonical key and are never registered.
    pub fn get_for_type_definition(&self, definition: &TypeDefinition) -> Option<Arc<dyn Deserializer>> {
        match definition.canonical_form() {
            Descriptor::Name(key) => self.get(&key),
            Descriptor::Array(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.table.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn register_date_time(&self) {
        self.add(DATE_TIME, Arc::new(DateTimeDeserializer));
    }

    pub fn register_primitive_coercions(&self) {
        for kind in ScalarKind::ALL {
            self.add(kind.primitive().name(), Arc::new(PrimitiveCoercer::new(kind)));
        }
    }

    pub fn register_defaults(&self) {
        self.register_date_time();
        self.register_primitive_coercions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PrimitiveKind;
    use crate::value::Value;

    #[test]
    fn defaults_cover_coercions_and_dates() {
        let registry = DeserializerRegistry::with_defaults();
        assert_eq!(registry.keys(), vec!["DateTime", "boolean", "float", "integer", "string"]);
        let integer = registry.get("integer").unwrap();
        assert_eq!(integer.deserialize(&Value::from("42")).unwrap(), Value::Int(42));
        assert!(registry.get("null").is_none());
    }

    #[test]
    fn lookups_by_definition_skip_arrays() {
        let registry = DeserializerRegistry::with_defaults();
        let float = TypeDefinition::Primitive(PrimitiveKind::Float);
        assert!(registry.get_for_type_definition(&float).is_some());
        let floats = TypeDefinition::ArrayOf(Box::new(float));
        assert!(registry.get_for_type_definition(&floats).is_none());
    }

    #[test]
    fn entries_can_be_overwritten() {
        let registry = DeserializerRegistry::new();
        assert!(registry.is_empty());
        registry.add("string", Arc::new(PrimitiveCoercer::integer()));
        registry.add("string", Arc::new(PrimitiveCoercer::string()));
        assert_eq!(registry.len(), 1);
        let d = registry.get("string").unwrap();
        assert_eq!(d.deserialize(&Value::Bool(true)).unwrap(), Value::from("1"));
    }

    #[test]
    fn types_are_added_through_the_catalog() {
        let catalog = TypeCatalog::new();
        let registry = DeserializerRegistry::new();
        registry.add_type("yes-no", "BooleanDeserializer", &catalog).unwrap();
        assert!(registry.contains("yes-no"));
        assert!(matches!(
            registry.add_type("list", "ArrayDeserializer", &catalog),
            Err(DeserializerInitError::UnsatisfiedDependencies(_))
        ));
        assert!(matches!(
            registry.add_type("dt", "DateTime", &catalog),
            Err(DeserializerInitError::NotADeserializer(_))
        ));
        assert!(!registry.contains("list"));
    }

    #[test]
    fn global_registry_is_shared() {
        let a = DeserializerRegistry::global();
        let b = DeserializerRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
