//! Merging of field selections that share a response name.
//!
//! Selections of the same response name in one merge scope must describe the same data: the same
//! schema field, with the same type and the same arguments. Their inclusion conditions are
//! combined by disjunction and their sub-selections are unioned, to be merged again one level
//! down.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::executable;

use crate::bail;
use crate::conditions::BVariable;
use crate::conditions::BooleanExpression;
use crate::error::IrError;
use crate::ir::IrArgument;
use crate::ir::IrFieldInfo;
use crate::ir::IrType;
use crate::ir::IrTypeRef;
use crate::ir::IrValue;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// One selection of a field, as found by a traversal.
#[derive(Debug, Clone)]
pub(crate) struct FieldInstance<'doc> {
    pub(crate) field: &'doc Node<executable::Field>,
    /// The type the field was selected on.
    pub(crate) parent_type: &'doc Name,
    pub(crate) condition: BooleanExpression<BVariable>,
}

impl FieldInstance<'_> {
    pub(crate) fn response_name(&self) -> &Name {
        self.field.response_key()
    }
}

/// The result of merging every instance of a response name.
#[derive(Debug, Clone)]
pub(crate) struct MergedField<'doc> {
    /// The first instance in traversal order.
    pub(crate) representative: &'doc Node<executable::Field>,
    /// The type the first instance was selected on.
    pub(crate) parent_type: &'doc Name,
    pub(crate) condition: BooleanExpression<BVariable>,
    /// The selection sets of every instance, in traversal order.
    pub(crate) child_selection_sets: Vec<&'doc executable::SelectionSet>,
}

impl<'doc> MergedField<'doc> {
    pub(crate) fn response_name(&self) -> &'doc Name {
        self.representative.response_key()
    }

    pub(crate) fn arguments(&self) -> Vec<IrArgument> {
        self.representative
            .arguments
            .iter()
            .map(|argument| IrArgument {
                name: argument.name.clone(),
                value: IrValue::from(argument.value.as_ref()),
            })
            .collect()
    }

    /// Describes the merged field. Metadata comes from the first instance.
    pub(crate) fn field_info(&self, ty: IrType, gql_type: IrTypeRef) -> IrFieldInfo {
        let definition = &self.representative.definition;
        IrFieldInfo {
            response_name: self.response_name().clone(),
            ty,
            gql_type: Some(gql_type),
            description: definition
                .description
                .as_ref()
                .map(|description| description.to_string()),
            deprecation_reason: definition.directives.get("deprecated").map(|deprecated| {
                deprecated
                    .specified_argument_by_name("reason")
                    .and_then(|reason| reason.as_str())
                    .unwrap_or(DEFAULT_DEPRECATION_REASON)
                    .to_owned()
            }),
            opt_in_feature: definition
                .directives
                .get("requiresOptIn")
                .and_then(|opt_in| opt_in.specified_argument_by_name("feature"))
                .and_then(|feature| feature.as_str())
                .map(str::to_owned),
        }
    }
}

/// Merges the instances of one response name, in traversal order.
pub(crate) fn merge_field_instances<'doc>(
    instances: &[FieldInstance<'doc>],
) -> Result<MergedField<'doc>, IrError> {
    let Some((first, rest)) = instances.split_first() else {
        bail!("cannot merge an empty list of fields");
    };
    let response_name = first.response_name();
    let first_arguments = coerced_arguments(first.field);
    for other in rest {
        if other.field.name != first.field.name {
            return Err(IrError::merge_conflict(
                response_name,
                format!(
                    "fields \"{}\" and \"{}\" are different fields",
                    first.field.name, other.field.name
                ),
            ));
        }
        if other.field.ty() != first.field.ty() {
            return Err(IrError::merge_conflict(
                response_name,
                format!(
                    "they return conflicting types \"{}\" and \"{}\"",
                    first.field.ty(),
                    other.field.ty()
                ),
            ));
        }
        if coerced_arguments(other.field) != first_arguments {
            return Err(IrError::merge_conflict(
                response_name,
                format!(
                    "they have differing arguments on \"{}.{}\"",
                    other.parent_type, other.field.name
                ),
            ));
        }
    }

    Ok(MergedField {
        representative: first.field,
        parent_type: first.parent_type,
        condition: BooleanExpression::any(
            instances
                .iter()
                .map(|instance| instance.condition.clone()),
        ),
        child_selection_sets: instances
            .iter()
            .map(|instance| &instance.field.selection_set)
            .collect(),
    })
}

/// The arguments of a field, with unspecified arguments set to their default value.
fn coerced_arguments(field: &executable::Field) -> IndexMap<Name, IrValue> {
    field
        .definition
        .arguments
        .iter()
        .filter_map(|definition| {
            let value = field
                .arguments
                .iter()
                .find(|argument| argument.name == definition.name)
                .map(|argument| argument.value.as_ref())
                .or(definition.default_value.as_deref())?;
            Some((definition.name.clone(), IrValue::from(value)))
        })
        .collect()
}

/// Groups instances by response name, keeping the order in which each name first appears.
pub(crate) fn group_by_response_name<'doc>(
    instances: impl IntoIterator<Item = FieldInstance<'doc>>,
) -> IndexMap<Name, Vec<FieldInstance<'doc>>> {
    let mut groups: IndexMap<Name, Vec<FieldInstance<'doc>>> = IndexMap::default();
    for instance in instances {
        groups
            .entry(instance.response_name().clone())
            .or_default()
            .push(instance);
    }
    groups
}

#[cfg(test)]
mod tests {
    use apollo_compiler::ExecutableDocument;
    use apollo_compiler::Schema;
    use apollo_compiler::executable::Selection;
    use apollo_compiler::validation::Valid;

    use super::*;

    const SCHEMA: &str = r#"
        type Query {
            "The hero of a movie."
            hero(episode: Episode = NEWHOPE): Character
            droid(id: ID!): Character @deprecated(reason: "Use `hero`.")
            field(point: Point): Int
            other: Int
        }
        enum Episode { NEWHOPE, EMPIRE }
        input Point { x: Int, y: Int }
        type Character { name: String, friends: [Character] }
    "#;

    /// Parses without validating, so that conflicting documents can be tested.
    fn fields_of(query: &str) -> (Valid<Schema>, ExecutableDocument) {
        let schema = Schema::parse_and_validate(SCHEMA, "schema.graphql").unwrap();
        let document = ExecutableDocument::parse(&schema, query, "query.graphql").unwrap();
        (schema, document)
    }

    fn instances(document: &ExecutableDocument) -> Vec<FieldInstance<'_>> {
        let operation = document.operations.iter().next().unwrap();
        operation
            .selection_set
            .selections
            .iter()
            .map(|selection| match selection {
                Selection::Field(field) => FieldInstance {
                    field,
                    parent_type: &operation.selection_set.ty,
                    condition: BooleanExpression::from_directives(&field.directives).unwrap(),
                },
                _ => panic!("expected a field"),
            })
            .collect()
    }

    #[test]
    fn identical_selections_merge_into_one() {
        let (_, document) = fields_of("{ field other field @include(if: false) }");
        let groups = group_by_response_name(instances(&document));
        assert_eq!(groups.len(), 2);
        let merged = merge_field_instances(&groups[0]).unwrap();
        assert_eq!(merged.response_name().as_str(), "field");
        assert!(merged.condition.is_true());
        assert_eq!(merged.child_selection_sets.len(), 2);
    }

    #[test]
    fn arguments_are_compared_after_default_coercion() {
        let (_, document) =
            fields_of("{ hero { name } hero(episode: NEWHOPE) { friends { name } } }");
        let heroes = instances(&document);
        let merged = merge_field_instances(&heroes).unwrap();
        // the representative keeps the arguments it was written with
        assert!(merged.arguments().is_empty());
        assert_eq!(merged.child_selection_sets.len(), 2);

        let (_, document) = fields_of(
            "{ field(point: { x: 1, y: 2 }) field(point: { y: 2, x: 1 }) }",
        );
        assert!(merge_field_instances(&instances(&document)).is_ok());
    }

    #[test]
    fn conflicting_arguments() {
        let (_, document) = fields_of("{ hero(episode: EMPIRE) { name } hero { name } }");
        let error = merge_field_instances(&instances(&document)).unwrap_err();
        assert_eq!(error.errors()[0].code(), "FIELD_MERGE_CONFLICT");
        assert_eq!(
            error.to_string(),
            r#"Cannot merge selections of "hero": they have differing arguments on "Query.hero""#
        );
    }

    #[test]
    fn conflicting_fields() {
        let (_, document) = fields_of("{ field: other field }");
        let error = merge_field_instances(&instances(&document)).unwrap_err();
        assert_eq!(
            error.to_string(),
            r#"Cannot merge selections of "field": fields "other" and "field" are different fields"#
        );
    }

    #[test]
    fn metadata_comes_from_the_first_instance() {
        let (_, document) = fields_of(r#"{ droid(id: "1") { name } }"#);
        let merged = merge_field_instances(&instances(&document)).unwrap();
        let info = merged.field_info(
            IrType::Model("operation.Q.data.droid".to_owned()),
            IrTypeRef::Named(apollo_compiler::name!("Character")),
        );
        assert_eq!(info.deprecation_reason.as_deref(), Some("Use `hero`."));
        assert_eq!(info.description, None);

        let (_, document) = fields_of("{ hero { name } }");
        let merged = merge_field_instances(&instances(&document)).unwrap();
        let info = merged.field_info(
            IrType::Model("operation.Q.data.hero".to_owned()),
            IrTypeRef::Named(apollo_compiler::name!("Character")),
        );
        assert_eq!(info.description.as_deref(), Some("The hero of a movie."));
        assert_eq!(info.deprecation_reason, None);
    }
}
