//! Schema files: model classes and registry aliases declared as JSON.
//!
//! ```json
//! {
//!   "models": {
//!     "Post": {
//!       "properties": { "title": "string", "tags": ["string"], "at": "DateTime" },
//!       "mandatory": ["title"],
//!       "throw_on_unknown": true,
//!       "deserializers": { "at": "DateTimeDeserializer" }
//!     }
//!   },
//!   "registry": { "boolean": "BooleanDeserializer" }
//! }
//! ```
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::TypeCatalog;
use crate::definition::Descriptor;
use crate::error::ConfigError;
use crate::model::{ModelClass, ModelContext};
use crate::registry::DeserializerRegistry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub models: IndexMap<String, ModelConfig>,
    /// Registry key → deserializer class name.
    #[serde(default)]
    pub registry: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub properties: IndexMap<String, Descriptor>,
    #[serde(default)]
    pub mandatory: Vec<String>,
    #[serde(default)]
    pub fillable: Vec<String>,
    #[serde(default)]
    pub guarded: Vec<String>,
    #[serde(default)]
    pub throw_on_unknown: bool,
    #[serde(default = "default_coerce")]
    pub coerce: bool,
    #[serde(default)]
    pub deserializers: IndexMap<String, Descriptor>,
}

fn default_coerce() -> bool {
    true
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let schema: Self = crate::path_de::from_slice_with_path(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            models = schema.models.len(),
            aliases = schema.registry.len(),
            "loaded schema file"
        );
        Ok(schema)
    }

    pub fn parse(src: &str) -> Result<Self, ConfigError> {
        crate::path_de::from_str_with_path(src)
    }

    /// Registers every model on a fresh [`TypeCatalog::new`] and interprets
    /// their shapes, so unknown type names fail here rather than on first use.
    pub fn catalog(&self) -> Result<TypeCatalog, ConfigError> {
        let mut catalog = TypeCatalog::new();
        for (name, config) in &self.models {
            catalog.register_model(config.to_class(name));
        }
        for class in catalog.models() {
            class.definitions(&catalog)?;
        }
        Ok(catalog)
    }

    /// Adds the file's aliases to `registry`, resolving class names through
    /// `catalog`.
    pub fn apply_registry(&self, registry: &DeserializerRegistry, catalog: &TypeCatalog) -> Result<(), ConfigError> {
        for (key, type_name) in &self.registry {
            registry.add_type(key.as_str(), type_name, catalog)?;
        }
        Ok(())
    }

    /// Catalog plus aliases, ready for hydration.
    pub fn context(&self, registry: Arc<DeserializerRegistry>) -> Result<ModelContext, ConfigError> {
        let catalog = self.catalog()?;
        self.apply_registry(&registry, &catalog)?;
        Ok(ModelContext::new(Arc::new(catalog), registry))
    }
}

impl ModelConfig {
    pub fn to_class(&self, name: &str) -> ModelClass {
        let mut builder = ModelClass::builder(name)
            .throw_on_unknown(self.throw_on_unknown)
            .coerce(self.coerce);
        for (key, descriptor) in &self.properties {
            builder = builder.property(key.as_str(), descriptor.clone());
        }
        for key in &self.mandatory {
            builder = builder.mandatory(key.as_str());
        }
        for key in &self.fillable {
            builder = builder.fillable(key.as_str());
        }
        for key in &self.guarded {
            builder = builder.guarded(key.as_str());
        }
        for (key, descriptor) in &self.deserializers {
            builder = builder.deserializer_descriptor(key.as_str(), descriptor.clone());
        }
        builder.build()
    }
}

// ---- Tests ---- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeserializerInitError, ModelError, TypeDefinitionError};
    use crate::value::Value;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Result<SchemaFile, ConfigError> {
        SchemaFile::parse(&value.to_string())
    }

    fn blog() -> SchemaFile {
        schema(json!({
            "models": {
                "Author": {
                    "properties": {"name": "string"},
                    "mandatory": ["name"]
                },
                "Post": {
                    "properties": {
                        "title": "string",
                        "tags": ["string"],
                        "author": "Author",
                        "at": "DateTime",
                        "views": "integer"
                    },
                    "mandatory": ["title"],
                    "throw_on_unknown": true,
                    "deserializers": {"views": "FloatDeserializer"}
                }
            },
            "registry": {"yes-no": "BooleanDeserializer"}
        }))
        .unwrap()
    }

    #[test]
    fn builds_a_working_context() {
        let registry = Arc::new(DeserializerRegistry::with_defaults());
        let ctx = blog().context(registry.clone()).unwrap();
        assert!(registry.contains("yes-no"));

        let post = ctx
            .model("Post", json!({"title": "Hi", "tags": ["a", 1], "author": {"name": "Ada"}}))
            .unwrap();
        assert_eq!(post.get("tags").unwrap(), &Value::from(vec!["a", "1"]));
        assert_eq!(post.get("author").unwrap().as_model().unwrap().class_name(), "Author");

        let err = ctx.model("Post", json!({"title": "Hi", "extra": 1})).unwrap_err();
        assert!(matches!(err, ModelError::UnknownProperty(_)));
    }

    #[test]
    fn explicit_descriptors_become_explicit_deserializers() {
        let ctx = blog().context(Arc::new(DeserializerRegistry::with_defaults())).unwrap();
        let post = ctx.model("Post", json!({"title": "Hi"})).unwrap();
        assert_eq!(post.deserializers().resolution("views").unwrap().state_name(), "explicit");
        assert_eq!(post.deserializers().resolution("title").unwrap().state_name(), "fallback");
    }

    #[test]
    fn defaults_apply_to_omitted_settings() {
        let file = schema(json!({"models": {"Empty": {}}})).unwrap();
        let config = &file.models["Empty"];
        assert!(config.coerce);
        assert!(!config.throw_on_unknown);
        assert!(file.registry.is_empty());
    }

    #[test]
    fn unknown_fields_are_reported_with_their_path() {
        let err = schema(json!({"models": {"Post": {"propertys": {}}}})).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path.starts_with("models.Post")));
    }

    #[test]
    fn unknown_type_names_fail_early() {
        let file = schema(json!({"models": {"Post": {"properties": {"x": "Nope"}}}})).unwrap();
        assert!(matches!(
            file.catalog(),
            Err(ConfigError::Definition(TypeDefinitionError::UnknownPrimitive(_)))
        ));
    }

    #[test]
    fn aliases_must_be_buildable() {
        let file = schema(json!({"registry": {"list": "ArrayDeserializer"}})).unwrap();
        let catalog = file.catalog().unwrap();
        let registry = DeserializerRegistry::new();
        assert!(matches!(
            file.apply_registry(&registry, &catalog),
            Err(ConfigError::Init(DeserializerInitError::UnsatisfiedDependencies(_)))
        ));
    }
}
