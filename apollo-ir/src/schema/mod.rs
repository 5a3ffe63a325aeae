//! A read-only index over a validated schema, answering the type questions the IR builder asks.
use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast::OperationType;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;

use crate::error::IrError;
use crate::internal_error;

pub mod type_ref;

/// The kind of a named schema type, as far as generated code is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum TypeKind {
    #[strum(to_string = "scalar")]
    Scalar,
    #[strum(to_string = "enum")]
    Enum,
    #[strum(to_string = "input object")]
    InputObject,
    #[strum(to_string = "object")]
    Object,
    #[strum(to_string = "interface")]
    Interface,
    #[strum(to_string = "union")]
    Union,
}

impl TypeKind {
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }
}

/// A validated schema together with its possible-types relation.
///
/// The possible types of every abstract type are computed once, in schema definition order, so
/// that lookups never depend on hash iteration order.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    schema: Valid<Schema>,
    possible_types: IndexMap<Name, IndexSet<Name>>,
}

impl SchemaIndex {
    pub fn new(schema: Valid<Schema>) -> Self {
        let mut possible_types: IndexMap<Name, IndexSet<Name>> = IndexMap::default();
        for (name, ty) in &schema.types {
            match ty {
                ExtendedType::Object(object) => {
                    possible_types
                        .entry(name.clone())
                        .or_default()
                        .insert(name.clone());
                    // GraphQL requires objects to list every interface they transitively
                    // implement, so direct membership is enough.
                    for interface in &object.implements_interfaces {
                        possible_types
                            .entry(interface.name.clone())
                            .or_default()
                            .insert(name.clone());
                    }
                }
                ExtendedType::Interface(_) => {
                    possible_types.entry(name.clone()).or_default();
                }
                ExtendedType::Union(union_) => {
                    possible_types.insert(
                        name.clone(),
                        union_
                            .members
                            .iter()
                            .map(|member| member.name.clone())
                            .collect(),
                    );
                }
                ExtendedType::Scalar(_) | ExtendedType::Enum(_) | ExtendedType::InputObject(_) => {
                }
            }
        }
        Self {
            schema,
            possible_types,
        }
    }

    /// Parses and validates SDL into an index.
    pub fn parse(sdl: &str, path: &str) -> Result<Self, IrError> {
        let schema = Schema::parse_and_validate(sdl, path)
            .map_err(|errors| internal_error!("invalid schema: {}", errors.errors))?;
        Ok(Self::new(schema))
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn get_type(&self, name: &str) -> Result<&ExtendedType, IrError> {
        self.schema
            .types
            .get(name)
            .ok_or_else(|| IrError::unknown_type(name))
    }

    pub fn type_kind(&self, name: &str) -> Result<TypeKind, IrError> {
        Ok(match self.get_type(name)? {
            ExtendedType::Scalar(_) => TypeKind::Scalar,
            ExtendedType::Enum(_) => TypeKind::Enum,
            ExtendedType::InputObject(_) => TypeKind::InputObject,
            ExtendedType::Object(_) => TypeKind::Object,
            ExtendedType::Interface(_) => TypeKind::Interface,
            ExtendedType::Union(_) => TypeKind::Union,
        })
    }

    /// The object types that can occur at a position of the given composite type, in schema
    /// order. An interface without implementations has no possible types.
    pub fn possible_types(&self, name: &str) -> Result<&IndexSet<Name>, IrError> {
        match self.possible_types.get(name) {
            Some(possible_types) => Ok(possible_types),
            None => {
                let kind = self.type_kind(name)?;
                Err(internal_error!(
                    "cannot compute possible types of {kind} type \"{name}\""
                ))
            }
        }
    }

    /// The possible types of `name` that are also in `within`, in the order of `within`.
    pub fn possible_types_within(
        &self,
        name: &str,
        within: &IndexSet<Name>,
    ) -> Result<IndexSet<Name>, IrError> {
        let possible_types = self.possible_types(name)?;
        Ok(within
            .iter()
            .filter(|ty| possible_types.contains(*ty))
            .cloned()
            .collect())
    }

    pub fn root_type(&self, operation_type: OperationType) -> Result<&Name, IrError> {
        self.schema
            .root_operation(operation_type)
            .ok_or_else(|| internal_error!("schema has no root {operation_type:?} type"))
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    const SDL: &str = r#"
        type Query { node: Node, pet: Pet }
        interface Node { id: ID! }
        interface Named { name: String }
        type Cat implements Node & Named { id: ID!, name: String, meow: String }
        type Dog implements Node & Named { id: ID!, name: String, bark: String }
        type Bird implements Node { id: ID! }
        union Pet = Dog | Cat
    "#;

    #[test]
    fn possible_types_follow_schema_order() {
        let index = SchemaIndex::parse(SDL, "schema.graphql").unwrap();
        let node: Vec<_> = index.possible_types("Node").unwrap().iter().cloned().collect();
        assert_eq!(node, [name!("Cat"), name!("Dog"), name!("Bird")]);
        let named: Vec<_> = index.possible_types("Named").unwrap().iter().cloned().collect();
        assert_eq!(named, [name!("Cat"), name!("Dog")]);
        // unions keep their member order
        let pet: Vec<_> = index.possible_types("Pet").unwrap().iter().cloned().collect();
        assert_eq!(pet, [name!("Dog"), name!("Cat")]);
        let cat: Vec<_> = index.possible_types("Cat").unwrap().iter().cloned().collect();
        assert_eq!(cat, [name!("Cat")]);
    }

    #[test]
    fn possible_types_within_keeps_enclosing_order() {
        let index = SchemaIndex::parse(SDL, "schema.graphql").unwrap();
        let node = index.possible_types("Node").unwrap().clone();
        let pets: Vec<_> = index
            .possible_types_within("Pet", &node)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(pets, [name!("Cat"), name!("Dog")]);
    }

    #[test]
    fn unknown_and_leaf_types() {
        let index = SchemaIndex::parse(SDL, "schema.graphql").unwrap();
        let error = index.possible_types("Fish").unwrap_err();
        assert_eq!(error.to_string(), r#"Unknown type "Fish""#);
        assert!(index.possible_types("String").unwrap_err().is_internal());
        assert_eq!(index.type_kind("Pet").unwrap(), TypeKind::Union);
        assert_eq!(
            index.root_type(OperationType::Query).unwrap().as_str(),
            "Query"
        );
        assert!(index.root_type(OperationType::Mutation).is_err());
    }
}
