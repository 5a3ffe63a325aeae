use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable;
use apollo_compiler::schema::ExtendedType;

use crate::error::IrError;
use crate::schema::SchemaIndex;

/// The schema types and fields one operation or fragment references.
///
/// Each root records into its own `Usage`, which is only merged into the global maps once the
/// root has been built successfully.
#[derive(Debug, Clone, Default)]
pub(crate) struct Usage {
    pub(crate) types: IndexSet<Name>,
    pub(crate) fields: IndexMap<Name, IndexSet<Name>>,
}

impl Usage {
    pub(crate) fn record_type(&mut self, name: &Name) {
        self.types.insert(name.clone());
    }

    pub(crate) fn record_types<'a>(&mut self, names: impl IntoIterator<Item = &'a Name>) {
        self.types.extend(names.into_iter().cloned());
    }

    /// Records a field and its parent type. Introspection fields are not part of the schema.
    pub(crate) fn record_field(&mut self, parent_type: &Name, field_name: &Name) {
        if field_name.starts_with("__") {
            return;
        }
        self.record_type(parent_type);
        self.fields
            .entry(parent_type.clone())
            .or_default()
            .insert(field_name.clone());
    }

    /// Records a selected field: its parent type, its output type and the input types of the
    /// arguments it is given.
    pub(crate) fn record_field_selection(
        &mut self,
        schema: &SchemaIndex,
        parent_type: &Name,
        field: &executable::Field,
    ) -> Result<(), IrError> {
        self.record_field(parent_type, &field.name);
        self.record_type(field.ty().inner_named_type());
        for argument in &field.arguments {
            if let Some(definition) = field.definition.argument_by_name(&argument.name) {
                self.record_input_type(schema, definition.ty.inner_named_type())?;
            }
        }
        Ok(())
    }

    /// Records an input type. Input objects are expanded to the types of their fields.
    pub(crate) fn record_input_type(
        &mut self,
        schema: &SchemaIndex,
        name: &Name,
    ) -> Result<(), IrError> {
        if !self.types.insert(name.clone()) {
            return Ok(());
        }
        if let ExtendedType::InputObject(input_object) = schema.get_type(name)? {
            for field in input_object.fields.values() {
                self.record_input_type(schema, field.ty.inner_named_type())?;
            }
        }
        Ok(())
    }

    pub(crate) fn merge(&mut self, other: Self) {
        self.types.extend(other.types);
        for (parent_type, fields) in other.fields {
            self.fields.entry(parent_type).or_default().extend(fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn input_objects_are_expanded_once() {
        let schema = SchemaIndex::parse(
            r#"
            type Query { search(filter: Filter): Int }
            input Filter { text: String, and: [Filter!], range: Range }
            input Range { from: Int, to: Int }
            "#,
            "schema.graphql",
        )
        .unwrap();
        let mut usage = Usage::default();
        usage.record_input_type(&schema, &name!("Filter")).unwrap();
        let types: Vec<_> = usage.types.iter().map(|ty| ty.as_str()).collect();
        assert_eq!(types, ["Filter", "String", "Range", "Int"]);
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let mut first = Usage::default();
        first.record_field(&name!("Query"), &name!("hero"));
        first.record_field(&name!("Character"), &name!("__typename"));
        let mut second = Usage::default();
        second.record_field(&name!("Character"), &name!("name"));
        second.record_field(&name!("Query"), &name!("droid"));
        first.merge(second);
        let types: Vec<_> = first.types.iter().map(|ty| ty.as_str()).collect();
        assert_eq!(types, ["Query", "Character"]);
        let query: Vec<_> = first.fields[&name!("Query")]
            .iter()
            .map(|field| field.as_str())
            .collect();
        assert_eq!(query, ["hero", "droid"]);
    }
}
