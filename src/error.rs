//! Error taxonomy.
//!
//! Interpretation and initialization failures are resolved by fallback where a
//! fallback exists; per-value failures always reach the caller.
use thiserror::Error;

/// A shape descriptor could not be turned into a type definition.
#[derive(Debug, Error)]
pub enum TypeDefinitionError {
    #[error("unknown primitive type `{0}`")]
    UnknownPrimitive(String),
    #[error("the wanted class `{0}` does not exist")]
    UnknownClass(String),
    #[error("array descriptors must wrap exactly one element type, got {0}")]
    MalformedArray(usize),
}

/// No deserializer could be built for a type.
#[derive(Debug, Error)]
pub enum DeserializerInitError {
    #[error("no appropriate deserializer factory exists for `{0}`")]
    NoFactory(String),
    #[error("`{0}` is not a deserializer")]
    NotADeserializer(String),
    #[error("deserializer `{0}` has dependencies which cannot be satisfied")]
    UnsatisfiedDependencies(String),
    #[error("type `{0}` is not known")]
    UnknownType(String),
    #[error(transparent)]
    Definition(#[from] TypeDefinitionError),
}

/// A value could not be converted by a deserializer.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("{deserializer} cannot deserialize a value of kind {found}")]
    Unsupported {
        deserializer: &'static str,
        found: &'static str,
    },
    #[error("cannot deserialize given date `{0}`")]
    UnparseableDate(String),
    #[error("cannot deserialize one or more items in the given array")]
    InvalidItems,
    #[error("nested model could not be constructed: {0}")]
    Model(#[source] Box<ModelError>),
}

/// Model hydration failures.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model `{model}` is missing mandatory properties: {}", missing.join(", "))]
    MissingMandatory { model: String, missing: Vec<String> },
    #[error("cannot set property with key `{0}`")]
    UnknownProperty(String),
    #[error("trying to set an invalid value for key `{key}` (expected {expected})")]
    InvalidValue { key: String, expected: String },
    #[error("property with key `{0}` not found on this model instance")]
    PropertyNotFound(String),
    #[error("no model class named `{0}` is registered")]
    UnknownModel(String),
    #[error("model input must be an object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid shape for model `{model}`: {source}")]
    Definition {
        model: String,
        #[source]
        source: TypeDefinitionError,
    },
    #[error("failed to deserialize value for key `{key}`: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: DeserializationError,
    },
}

/// Failures while loading a schema file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("at JSON path {path} → {message}")]
    Parse { path: String, message: String },
    #[error(transparent)]
    Definition(#[from] TypeDefinitionError),
    #[error(transparent)]
    Init(#[from] DeserializerInitError),
}
