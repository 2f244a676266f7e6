use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::catalog::TypeCatalog;
use crate::definition::{DefinitionMap, Descriptor, TypeDefinitionInterpreter};
use crate::deserializer::Deserializer;
use crate::error::TypeDefinitionError;
use crate::properties::ExplicitDeserializer;

/// Static description of a model: its shape and hydration rules.
///
/// The shape is interpreted into type definitions on first use and shared by
/// every instance afterwards.
#[derive(Debug)]
pub struct ModelClass {
    name: String,
    settable: IndexMap<String, Descriptor>,
    mandatory: Vec<String>,
    fillable: Vec<String>,
    guarded: Vec<String>,
    throw_on_unknown: bool,
    coerce: bool,
    deserializers: IndexMap<String, ExplicitDeserializer>,
    definitions: OnceCell<Arc<DefinitionMap>>,
}

#[derive(Debug)]
pub struct ModelClassBuilder {
    class: ModelClass,
}

impl ModelClass {
    pub fn builder(name: impl Into<String>) -> ModelClassBuilder {
        ModelClassBuilder {
            class: ModelClass {
                name: name.into(),
                settable: IndexMap::new(),
                mandatory: Vec::new(),
                fillable: Vec::new(),
                guarded: Vec::new(),
                throw_on_unknown: false,
                coerce: true,
                deserializers: IndexMap::new(),
                definitions: OnceCell::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared shape, as written.
    pub fn structure(&self) -> &IndexMap<String, Descriptor> {
        &self.settable
    }

    pub fn mandatory(&self) -> &[String] {
        &self.mandatory
    }

    pub fn throws_on_unknown(&self) -> bool {
        self.throw_on_unknown
    }

    /// Whether values are run through deserializers before assignment.
    pub fn coerces(&self) -> bool {
        self.coerce
    }

    pub fn explicit_deserializers(&self) -> &IndexMap<String, ExplicitDeserializer> {
        &self.deserializers
    }

    pub fn is_property_known(&self, key: &str) -> bool {
        self.settable.contains_key(key)
    }

    /// Mass-assignment guard: a non-empty fillable list is exclusive,
    /// otherwise everything not guarded may be hydrated.
    pub fn can_hydrate(&self, key: &str) -> bool {
        if self.fillable.is_empty() {
            !self.guarded.iter().any(|g| g == key)
        } else {
            self.fillable.iter().any(|f| f == key)
        }
    }

    /// Mandatory keys absent from `present`, in declaration order.
    pub fn missing_mandatory<'a>(&self, present: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let present: Vec<&String> = present.into_iter().collect();
        self.mandatory
            .iter()
            .filter(|key| !present.contains(key))
            .cloned()
            .collect()
    }

    /// Interpreted once; failures are not cached.
    pub fn definitions(&self, catalog: &TypeCatalog) -> Result<Arc<DefinitionMap>, TypeDefinitionError> {
        self.definitions
            .get_or_try_init(|| {
                TypeDefinitionInterpreter::new(catalog)
                    .create_definition_map(&self.settable)
                    .map(Arc::new)
            })
            .cloned()
    }
}

impl ModelClassBuilder {
    pub fn property(mut self, key: impl Into<String>, descriptor: impl Into<Descriptor>) -> Self {
        self.class.settable.insert(key.into(), descriptor.into());
        self
    }

    pub fn mandatory(mut self, key: impl Into<String>) -> Self {
        self.class.mandatory.push(key.into());
        self
    }

    pub fn fillable(mut self, key: impl Into<String>) -> Self {
        self.class.fillable.push(key.into());
        self
    }

    pub fn guarded(mut self, key: impl Into<String>) -> Self {
        self.class.guarded.push(key.into());
        self
    }

    pub fn throw_on_unknown(mut self, throw: bool) -> Self {
        self.class.throw_on_unknown = throw;
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.class.coerce = coerce;
        self
    }

    pub fn deserializer(mut self, key: impl Into<String>, deserializer: Arc<dyn Deserializer>) -> Self {
        self.class.deserializers.insert(key.into(), ExplicitDeserializer::Instance(deserializer));
        self
    }

    pub fn deserializer_descriptor(mut self, key: impl Into<String>, descriptor: impl Into<Descriptor>) -> Self {
        self.class
            .deserializers
            .insert(key.into(), ExplicitDeserializer::Descriptor(descriptor.into()));
        self
    }

    pub fn build(self) -> ModelClass {
        self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fillable_is_exclusive_and_guarded_excludes() {
        let open = ModelClass::builder("Open").guarded("id").build();
        assert!(open.can_hydrate("title"));
        assert!(!open.can_hydrate("id"));

        let strict = ModelClass::builder("Strict").fillable("title").guarded("title").build();
        assert!(strict.can_hydrate("title"));
        assert!(!strict.can_hydrate("body"));
    }

    #[test]
    fn reports_missing_mandatory_keys_in_order() {
        let class = ModelClass::builder("Post").mandatory("title").mandatory("body").build();
        let present = ["body".to_string()];
        assert_eq!(class.missing_mandatory(present.iter()), vec!["title".to_string()]);
        assert!(class.missing_mandatory(["title".to_string(), "body".to_string()].iter()).is_empty());
    }

    #[test]
    fn definitions_are_interpreted_once() {
        let catalog = TypeCatalog::new();
        let class = ModelClass::builder("Post").property("at", "DateTime").build();
        let a = class.definitions(&catalog).unwrap();
        let b = class.definitions(&catalog).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn failed_interpretation_is_retried() {
        let class = ModelClass::builder("Post").property("author", "Author").build();
        assert!(class.definitions(&TypeCatalog::new()).is_err());

        let mut catalog = TypeCatalog::new();
        catalog.register_model(ModelClass::builder("Author").build());
        assert!(class.definitions(&catalog).is_ok());
    }
}
