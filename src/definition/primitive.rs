use std::str::FromStr;

use crate::error::TypeDefinitionError;
use crate::value::Value;

/// The closed set of primitive kinds a property can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Float,
    String,
    Null,
    Resource,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Integer,
        PrimitiveKind::Float,
        PrimitiveKind::String,
        PrimitiveKind::Null,
        PrimitiveKind::Resource,
    ];

    /// Canonical name, also the registry key.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::String => "string",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Resource => "resource",
        }
    }

    /// Accepts canonical names plus the gettype spellings `double` and `NULL`.
    pub fn parse(name: &str) -> Result<Self, TypeDefinitionError> {
        match name {
            "boolean" => Ok(PrimitiveKind::Boolean),
            "integer" => Ok(PrimitiveKind::Integer),
            "float" | "double" => Ok(PrimitiveKind::Float),
            "string" => Ok(PrimitiveKind::String),
            "null" | "NULL" => Ok(PrimitiveKind::Null),
            "resource" => Ok(PrimitiveKind::Resource),
            other => Err(TypeDefinitionError::UnknownPrimitive(other.to_string())),
        }
    }

    pub fn validate(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::Boolean, Value::Bool(_))
                | (PrimitiveKind::Integer, Value::Int(_))
                | (PrimitiveKind::Float, Value::Float(_))
                | (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Null, Value::Null)
                | (PrimitiveKind::Resource, Value::Resource(_))
        )
    }

    pub fn default_value(self) -> Value {
        match self {
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Integer => Value::Int(0),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::String => Value::String(String::new()),
            PrimitiveKind::Null | PrimitiveKind::Resource => Value::Null,
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = TypeDefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
