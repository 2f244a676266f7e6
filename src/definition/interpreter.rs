use indexmap::IndexMap;

use super::{ClassRef, DefinitionMap, Descriptor, PrimitiveKind, TypeDefinition};
use crate::catalog::{TypeCatalog, TypeOracle};
use crate::error::TypeDefinitionError;

/// Turns shape descriptors into [`TypeDefinition`] trees.
///
/// Names known to the catalog become class references; every other name must
/// be a primitive kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeDefinitionInterpreter<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> TypeDefinitionInterpreter<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    pub fn interpret(&self, descriptor: &Descriptor) -> Result<TypeDefinition, TypeDefinitionError> {
        match descriptor {
            Descriptor::Array(inner) => match inner.as_slice() {
                [element] => Ok(TypeDefinition::ArrayOf(Box::new(self.interpret(element)?))),
                other => Err(TypeDefinitionError::MalformedArray(other.len())),
            },
            Descriptor::Name(name) if self.catalog.type_exists(name) => {
                Ok(TypeDefinition::Class(ClassRef::new(name, self.catalog)?))
            }
            Descriptor::Name(name) => Ok(TypeDefinition::Primitive(PrimitiveKind::parse(name)?)),
        }
    }

    /// All or nothing: the first failing entry fails the whole map.
    pub fn create_definition_map(
        &self,
        shape: &IndexMap<String, Descriptor>,
    ) -> Result<DefinitionMap, TypeDefinitionError> {
        shape
            .iter()
            .map(|(key, descriptor)| Ok((key.clone(), self.interpret(descriptor)?)))
            .collect()
    }
}
