//! Resolution of schema type references into [`IrTypeRef`] and [`IrType`].
use apollo_compiler::Name;
use apollo_compiler::ast;
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::take_while;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::character::complete::multispace0;
use nom::combinator::all_consuming;
use nom::combinator::map;
use nom::combinator::map_res;
use nom::combinator::opt;
use nom::combinator::recognize;
use nom::sequence::delimited;
use nom::sequence::pair;
use nom::sequence::preceded;
use nom::sequence::terminated;

use super::SchemaIndex;
use super::TypeKind;
use crate::error::IrError;
use crate::error::SingleIrError;
use crate::ir::IrType;
use crate::ir::IrTypeRef;

/// Resolves type references against a schema and classifies their named leaf types.
pub struct TypeRefResolver<'schema> {
    schema: &'schema SchemaIndex,
}

impl<'schema> TypeRefResolver<'schema> {
    pub fn new(schema: &'schema SchemaIndex) -> Self {
        Self { schema }
    }

    /// Converts a parsed type reference, outside-in. Fails with `UnknownType` if the named type
    /// at the leaf is not in the schema.
    pub fn resolve(&self, ty: &ast::Type) -> Result<IrTypeRef, IrError> {
        Ok(match ty {
            ast::Type::Named(name) => self.resolve_named(name)?,
            ast::Type::NonNullNamed(name) => {
                IrTypeRef::NonNull(Box::new(self.resolve_named(name)?))
            }
            ast::Type::List(inner) => IrTypeRef::List(Box::new(self.resolve(inner)?)),
            ast::Type::NonNullList(inner) => IrTypeRef::NonNull(Box::new(IrTypeRef::List(
                Box::new(self.resolve(inner)?),
            ))),
        })
    }

    /// Parses and resolves GraphQL type syntax such as `[Episode!]!`.
    pub fn resolve_str(&self, reference: &str) -> Result<IrTypeRef, IrError> {
        let ty = parse_type(reference)?;
        self.resolve(&ty)
    }

    fn resolve_named(&self, name: &Name) -> Result<IrTypeRef, IrError> {
        self.schema.get_type(name)?;
        Ok(IrTypeRef::Named(name.clone()))
    }

    /// Converts a resolved leaf-typed reference (scalar, enum or input object) into an `IrType`.
    pub fn to_input_ir_type(&self, type_ref: &IrTypeRef) -> Result<IrType, IrError> {
        self.to_ir_type(type_ref, None)
    }

    /// Converts a resolved reference into an `IrType`. The composite leaf of an output field is
    /// replaced by the id of the model generated for its selection set.
    pub fn to_ir_type(
        &self,
        type_ref: &IrTypeRef,
        model_id: Option<&str>,
    ) -> Result<IrType, IrError> {
        Ok(match type_ref {
            IrTypeRef::NonNull(inner) => IrType::NonNull(Box::new(self.to_ir_type(inner, model_id)?)),
            IrTypeRef::List(inner) => IrType::List(Box::new(self.to_ir_type(inner, model_id)?)),
            IrTypeRef::Named(name) => match self.schema.type_kind(name)? {
                TypeKind::Scalar => IrType::Scalar(name.clone()),
                TypeKind::Enum => IrType::Enum(name.clone()),
                TypeKind::InputObject => IrType::InputObject(name.clone()),
                kind @ (TypeKind::Object | TypeKind::Interface | TypeKind::Union) => {
                    let Some(model_id) = model_id else {
                        return Err(IrError::internal(format!(
                            "{kind} type \"{name}\" used without a model"
                        )));
                    };
                    IrType::Model(model_id.to_owned())
                }
            },
        })
    }
}

/// Parses GraphQL type syntax into an AST type.
pub fn parse_type(reference: &str) -> Result<ast::Type, IrError> {
    match all_consuming(delimited(multispace0, type_reference, multispace0))(reference) {
        Ok((_, ty)) => Ok(ty),
        Err(error) => Err(SingleIrError::InvalidTypeReference {
            reference: reference.to_owned(),
            message: error.to_string(),
        }
        .into()),
    }
}

fn name(input: &str) -> IResult<&str, Name> {
    map_res(
        recognize(pair(
            take_while1(|c: char| c == '_' || c.is_ascii_alphabetic()),
            take_while(|c: char| c == '_' || c.is_ascii_alphanumeric()),
        )),
        Name::new,
    )(input)
}

fn type_reference(input: &str) -> IResult<&str, ast::Type> {
    let list = delimited(
        terminated(char('['), multispace0),
        type_reference,
        preceded(multispace0, char(']')),
    );
    let (input, ty) = alt((
        map(list, |inner| ast::Type::List(Box::new(inner))),
        map(name, ast::Type::Named),
    ))(input)?;
    let (input, non_null) = opt(preceded(multispace0, char('!')))(input)?;
    let ty = match (ty, non_null) {
        (ast::Type::Named(name), Some(_)) => ast::Type::NonNullNamed(name),
        (ast::Type::List(inner), Some(_)) => ast::Type::NonNullList(inner),
        (ty, _) => ty,
    };
    Ok((input, ty))
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use pretty_assertions::assert_eq;

    use super::*;

    fn schema() -> SchemaIndex {
        SchemaIndex::parse(
            r#"
            type Query { hero(episode: Episode): Character }
            enum Episode { NEWHOPE, EMPIRE }
            type Character { name: String }
            input ReviewInput { stars: Int! }
            "#,
            "schema.graphql",
        )
        .unwrap()
    }

    #[test]
    fn resolves_outside_in() {
        let schema = schema();
        let resolver = TypeRefResolver::new(&schema);
        let resolved = resolver.resolve_str("[Episode!]!").unwrap();
        assert_eq!(
            resolved,
            IrTypeRef::NonNull(Box::new(IrTypeRef::List(Box::new(IrTypeRef::NonNull(
                Box::new(IrTypeRef::Named(name!("Episode")))
            )))))
        );
        assert_eq!(resolved.to_string(), "[Episode!]!");
        assert_eq!(resolved.leaf_name().as_str(), "Episode");
        assert_eq!(
            resolver.resolve_str(" [ [ Int ] ! ] ").unwrap().to_string(),
            "[[Int]!]"
        );
    }

    #[test]
    fn parsed_and_textual_references_agree() {
        let schema = schema();
        let resolver = TypeRefResolver::new(&schema);
        let parsed = ast::Type::NonNullList(Box::new(ast::Type::Named(name!("ReviewInput"))));
        assert_eq!(
            resolver.resolve(&parsed).unwrap(),
            resolver.resolve_str("[ReviewInput]!").unwrap()
        );
    }

    #[test]
    fn unknown_types_are_fatal() {
        let schema = schema();
        let resolver = TypeRefResolver::new(&schema);
        let error = resolver.resolve_str("[Starship!]").unwrap_err();
        assert_eq!(error.to_string(), r#"Unknown type "Starship""#);
        assert_eq!(error.errors()[0].code(), "UNKNOWN_TYPE");
    }

    #[test]
    fn malformed_references() {
        for reference in ["", "[Int", "Int!!", "1Int", "[]"] {
            let error = parse_type(reference).unwrap_err();
            assert_eq!(
                error.errors()[0].code(),
                "INVALID_TYPE_REFERENCE",
                "{reference:?}"
            );
        }
    }

    #[test]
    fn classifies_leaf_types() {
        let schema = schema();
        let resolver = TypeRefResolver::new(&schema);
        let episode = resolver.resolve_str("Episode!").unwrap();
        assert_eq!(
            resolver.to_input_ir_type(&episode).unwrap(),
            IrType::NonNull(Box::new(IrType::Enum(name!("Episode"))))
        );
        let review = resolver.resolve_str("[ReviewInput]").unwrap();
        assert_eq!(
            resolver.to_input_ir_type(&review).unwrap(),
            IrType::List(Box::new(IrType::InputObject(name!("ReviewInput"))))
        );
        let character = resolver.resolve_str("Character").unwrap();
        assert!(resolver.to_input_ir_type(&character).is_err());
        assert_eq!(
            resolver
                .to_ir_type(&character, Some("operation.Hero.data.hero"))
                .unwrap(),
            IrType::Model("operation.Hero.data.hero".to_owned())
        );
    }
}
