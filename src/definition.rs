//! Type definitions: what a declared property is allowed to hold.
//!
//! A definition is interpreted once from a shape [`Descriptor`] and is then an
//! immutable, queryable value: exact validation without coercion, the zero
//! value for the type, and the canonical form used as a registry key.
pub mod interpreter;
pub mod primitive;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::TypeCatalog;
use crate::error::TypeDefinitionError;
use crate::value::Value;

pub use interpreter::TypeDefinitionInterpreter;
pub use primitive::PrimitiveKind;

/// Type definitions keyed by property, in declaration order.
pub type DefinitionMap = IndexMap<String, TypeDefinition>;

/// Instance check for value classes registered in the catalog.
pub type InstanceCheck = fn(&Value) -> bool;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Raw shape descriptor entry: a type name, or `[inner]` for "array of inner".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    Name(String),
    Array(Vec<Descriptor>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Class(ClassRef),
    ArrayOf(Box<TypeDefinition>),
}

/// Reference to a class known to the catalog at construction time.
#[derive(Debug, Clone)]
pub struct ClassRef {
    name: String,
    kind: ClassKind,
}

#[derive(Debug, Clone, Copy)]
pub enum ClassKind {
    Model,
    Deserializer,
    Value(InstanceCheck),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Descriptor {
    pub fn array_of(inner: impl Into<Descriptor>) -> Self {
        Descriptor::Array(vec![inner.into()])
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Descriptor::Name(n) => Some(n),
            Descriptor::Array(_) => None,
        }
    }
}

impl From<&str> for Descriptor {
    fn from(name: &str) -> Self { Descriptor::Name(name.to_string()) }
}

impl From<String> for Descriptor {
    fn from(name: String) -> Self { Descriptor::Name(name) }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Name(n) => f.write_str(n),
            Descriptor::Array(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl TypeDefinition {
    /// Type check without coercion.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            TypeDefinition::Primitive(kind) => kind.validate(value),
            TypeDefinition::Class(class) => class.validate(value),
            TypeDefinition::ArrayOf(element) => match value.elements() {
                Some(mut items) => items.all(|item| element.validate(item)),
                None => false,
            },
        }
    }

    /// Zero value for the type.
    pub fn default_value(&self) -> Value {
        match self {
            TypeDefinition::Primitive(kind) => kind.default_value(),
            TypeDefinition::Class(_) => Value::Null,
            TypeDefinition::ArrayOf(_) => Value::List(Vec::new()),
        }
    }

    pub fn canonical_form(&self) -> Descriptor {
        match self {
            TypeDefinition::Primitive(kind) => Descriptor::from(kind.name()),
            TypeDefinition::Class(class) => Descriptor::from(class.name()),
            TypeDefinition::ArrayOf(element) => Descriptor::array_of(element.canonical_form()),
        }
    }

    pub fn element(&self) -> Option<&TypeDefinition> {
        match self {
            TypeDefinition::ArrayOf(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}

impl ClassRef {
    /// Fails unless the catalog knows `name`.
    pub fn new(name: &str, catalog: &TypeCatalog) -> Result<Self, TypeDefinitionError> {
        let kind = catalog
            .class_kind(name)
            .ok_or_else(|| TypeDefinitionError::UnknownClass(name.to_string()))?;
        Ok(Self { name: name.to_string(), kind })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Null, or an instance of the class.
    pub fn validate(&self, value: &Value) -> bool {
        if matches!(value, Value::Null) {
            return true;
        }
        match self.kind {
            ClassKind::Model => value.as_model().is_some_and(|m| m.class_name() == self.name),
            ClassKind::Value(is_instance) => is_instance(value),
            ClassKind::Deserializer => false,
        }
    }
}

// Classes are identified by name; the kind follows from the catalog.
impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ------------------------------- Tests ------------------------------------ //
