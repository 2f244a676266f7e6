//! Deserializer factories.
//!
//! A factory is a recipe for a deserializer; [`DeserializerFactoryProducer`]
//! picks the recipe for a type definition. Bare primitives have no recipe: the
//! producer fails and callers fall back to the [`DeserializerRegistry`].
//!
//! [`DeserializerRegistry`]: crate::registry::DeserializerRegistry
use std::fmt;
use std::sync::Arc;

use crate::catalog::{DeserializerConstructor, TypeCatalog, TypeOracle};
use crate::definition::{Descriptor, TypeDefinition, TypeDefinitionInterpreter};
use crate::deserializer::{ArrayDeserializer, Deserializer, ModelDeserializer};
use crate::error::DeserializerInitError;
use crate::model::{ModelClass, ModelContext};

pub trait DeserializerFactory: fmt::Debug {
    fn deserializer(&self) -> Result<Arc<dyn Deserializer>, DeserializerInitError>;
}

// ————————————————————————————————————————————————————————————————————————————
// FACTORIES
// ————————————————————————————————————————————————————————————————————————————

/// Builds a catalog-registered deserializer class through its zero-argument
/// constructor.
#[derive(Debug, Clone)]
pub struct TypeDeserializerFactory {
    name: String,
    construct: fn() -> Arc<dyn Deserializer>,
}

impl TypeDeserializerFactory {
    pub fn new(name: &str, catalog: &TypeCatalog) -> Result<Self, DeserializerInitError> {
        if !catalog.type_exists(name) {
            return Err(DeserializerInitError::UnknownType(name.to_string()));
        }
        if !catalog.is_deserializer(name) {
            return Err(DeserializerInitError::NotADeserializer(name.to_string()));
        }
        match catalog.constructor(name) {
            Some(DeserializerConstructor::NoArgs(construct)) if !catalog.has_dependencies(name) => {
                Ok(Self { name: name.to_string(), construct })
            }
            _ => Err(DeserializerInitError::UnsatisfiedDependencies(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl DeserializerFactory for TypeDeserializerFactory {
    fn deserializer(&self) -> Result<Arc<dyn Deserializer>, DeserializerInitError> {
        Ok((self.construct)())
    }
}

#[derive(Debug, Clone)]
pub struct ModelDeserializerFactory {
    class: Arc<ModelClass>,
    ctx: ModelContext,
}

impl ModelDeserializerFactory {
    pub fn new(class: Arc<ModelClass>, ctx: ModelContext) -> Self {
        Self { class, ctx }
    }
}

impl DeserializerFactory for ModelDeserializerFactory {
    fn deserializer(&self) -> Result<Arc<dyn Deserializer>, DeserializerInitError> {
        Ok(Arc::new(ModelDeserializer::new(self.class.clone(), self.ctx.clone())))
    }
}

#[derive(Debug)]
pub struct ArrayDeserializerFactory {
    element: Box<dyn DeserializerFactory>,
}

impl ArrayDeserializerFactory {
    pub fn new(element: Box<dyn DeserializerFactory>) -> Self {
        Self { element }
    }
}

impl DeserializerFactory for ArrayDeserializerFactory {
    fn deserializer(&self) -> Result<Arc<dyn Deserializer>, DeserializerInitError> {
        Ok(Arc::new(ArrayDeserializer::new(self.element.deserializer()?)))
    }
}

/// Hands out an already-built deserializer.
#[derive(Debug, Clone)]
pub struct SharedDeserializerFactory(Arc<dyn Deserializer>);

impl SharedDeserializerFactory {
    pub fn new(deserializer: Arc<dyn Deserializer>) -> Self {
        Self(deserializer)
    }
}

impl DeserializerFactory for SharedDeserializerFactory {
    fn deserializer(&self) -> Result<Arc<dyn Deserializer>, DeserializerInitError> {
        Ok(self.0.clone())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PRODUCER
// ————————————————————————————————————————————————————————————————————————————

pub struct DeserializerFactoryProducer;

impl DeserializerFactoryProducer {
    pub fn from_type_definition(
        definition: &TypeDefinition,
        ctx: &ModelContext,
    ) -> Result<Box<dyn DeserializerFactory>, DeserializerInitError> {
        match definition {
            TypeDefinition::ArrayOf(element) => {
                let element_factory: Box<dyn DeserializerFactory> =
                    match Self::from_type_definition(element, ctx) {
                        Ok(factory) => factory,
                        // elements without a route of their own use the registry default
                        Err(error) => match ctx.registry().get_for_type_definition(element) {
                            Some(deserializer) => Box::new(SharedDeserializerFactory::new(deserializer)),
                            None => return Err(error),
                        },
                    };
                Ok(Box::new(ArrayDeserializerFactory::new(element_factory)))
            }
            TypeDefinition::Class(class) => {
                let catalog = ctx.catalog();
                if catalog.is_model(class.name()) {
                    let model = catalog
                        .model(class.name())
                        .ok_or_else(|| DeserializerInitError::UnknownType(class.name().to_string()))?;
                    return Ok(Box::new(ModelDeserializerFactory::new(model.clone(), ctx.clone())));
                }
                Ok(Box::new(TypeDeserializerFactory::new(class.name(), catalog)?))
            }
            TypeDefinition::Primitive(kind) => Err(DeserializerInitError::NoFactory(kind.name().to_string())),
        }
    }

    /// Interprets a raw descriptor, then resolves it like a type definition.
    pub fn from_descriptor(
        descriptor: &Descriptor,
        ctx: &ModelContext,
    ) -> Result<Box<dyn DeserializerFactory>, DeserializerInitError> {
        let definition = TypeDefinitionInterpreter::new(ctx.catalog()).interpret(descriptor)?;
        Self::from_type_definition(&definition, ctx)
    }
}
