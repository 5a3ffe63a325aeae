//! Fragments declare no variables: the ones they use are inferred from where they are used.
use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::schema::ExtendedType;

use super::BuildContext;
use super::fragments::FragmentFacts;
use crate::error::IrError;
use crate::ir::IrVariable;

/// Collects the variables used in a selection set and in every fragment it spreads.
///
/// A variable gets the type of the first position it is used in, in traversal order. Inferred
/// variables never have a default value.
pub(crate) struct VariableCollector<'ctx, 'doc> {
    ctx: &'ctx BuildContext<'doc>,
    fragments: &'ctx mut FragmentFacts,
    variables: IndexMap<Name, IrVariable>,
}

impl<'ctx, 'doc> VariableCollector<'ctx, 'doc> {
    pub(crate) fn new(ctx: &'ctx BuildContext<'doc>, fragments: &'ctx mut FragmentFacts) -> Self {
        Self {
            ctx,
            fragments,
            variables: IndexMap::default(),
        }
    }

    pub(crate) fn finish(self) -> Vec<IrVariable> {
        self.variables.into_values().collect()
    }

    pub(crate) fn collect_selection_set(
        &mut self,
        selection_set: &'doc SelectionSet,
    ) -> Result<(), IrError> {
        for selection in &selection_set.selections {
            match selection {
                Selection::Field(field) => {
                    self.collect_directives(&field.directives)?;
                    for argument in &field.arguments {
                        if let Some(definition) = field.definition.argument_by_name(&argument.name)
                        {
                            self.collect_value(&argument.value, &definition.ty)?;
                        }
                    }
                    self.collect_selection_set(&field.selection_set)?;
                }
                Selection::FragmentSpread(spread) => {
                    self.collect_directives(&spread.directives)?;
                    for variable in self.fragments.variables(self.ctx, &spread.fragment_name)? {
                        self.variables
                            .entry(variable.name.clone())
                            .or_insert(variable);
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.collect_directives(&inline.directives)?;
                    self.collect_selection_set(&inline.selection_set)?;
                }
            }
        }
        Ok(())
    }

    fn collect_directives(&mut self, directives: &ast::DirectiveList) -> Result<(), IrError> {
        let definitions = &self.ctx.schema.schema().directive_definitions;
        for directive in directives.iter() {
            let Some(definition) = definitions.get(&directive.name) else {
                continue;
            };
            for argument in &directive.arguments {
                if let Some(argument_definition) = definition.argument_by_name(&argument.name) {
                    self.collect_value(&argument.value, &argument_definition.ty)?;
                }
            }
        }
        Ok(())
    }

    /// Walks a value in a position of type `ty`, down into lists and input objects.
    fn collect_value(&mut self, value: &ast::Value, ty: &ast::Type) -> Result<(), IrError> {
        match value {
            ast::Value::Variable(name) => {
                if !self.variables.contains_key(name) {
                    let resolver = self.ctx.resolver();
                    let ty = resolver.to_input_ir_type(&resolver.resolve(ty)?)?;
                    self.variables.insert(
                        name.clone(),
                        IrVariable {
                            name: name.clone(),
                            default_value: None,
                            ty,
                        },
                    );
                }
            }
            ast::Value::List(items) => {
                for item in items {
                    self.collect_value(item, ty.item_type())?;
                }
            }
            ast::Value::Object(fields) => {
                if let ExtendedType::InputObject(input_object) =
                    self.ctx.schema.get_type(ty.inner_named_type())?
                {
                    for (field_name, field_value) in fields {
                        if let Some(definition) = input_object.fields.get(field_name) {
                            self.collect_value(field_value, &definition.ty)?;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
