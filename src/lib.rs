//! Typed model hydration for loosely typed JSON.
//!
//! A model class declares a shape (property key → type descriptor). Building
//! a model interprets the shape into type definitions, resolves one
//! deserializer per key (class-declared, then inferred from the type, then the
//! registry default) and assigns every input value through that deserializer
//! and the type check.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod definition;
pub mod deserializer;
pub mod error;
pub mod factory;
pub mod jq_exec;
pub mod model;
pub mod path_de;
pub mod properties;
pub mod registry;
pub mod value;

pub use catalog::{TypeCatalog, TypeOracle};
pub use config::SchemaFile;
pub use definition::{Descriptor, TypeDefinition, TypeDefinitionInterpreter};
pub use deserializer::Deserializer;
pub use error::{ConfigError, DeserializationError, DeserializerInitError, ModelError, TypeDefinitionError};
pub use model::{Model, ModelClass, ModelContext};
pub use registry::DeserializerRegistry;
pub use value::Value;
