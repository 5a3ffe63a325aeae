//! The field collection traversal of response-based models.
//!
//! Starting from the selection sets at one position, every field and fragment spread reachable
//! through inline fragments and named fragments is collected together with the type set and the
//! variable condition accumulated on the way down. Fragments that cannot apply to any possible
//! type, or whose condition is `false`, are skipped along with everything under them.
use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;

use super::BuildContext;
use super::field_merger::FieldInstance;
use super::usage::Usage;
use crate::conditions::BVariable;
use crate::conditions::BooleanExpression;
use crate::error::IrError;
use crate::ir::TypeSet;

#[derive(Debug)]
pub(crate) struct CollectedField<'doc> {
    pub(crate) type_set: TypeSet,
    pub(crate) instance: FieldInstance<'doc>,
}

#[derive(Debug)]
pub(crate) struct CollectedSpread {
    pub(crate) fragment_name: Name,
    pub(crate) type_set: TypeSet,
}

#[derive(Debug, Default)]
pub(crate) struct CollectedSelections<'doc> {
    pub(crate) fields: Vec<CollectedField<'doc>>,
    pub(crate) spreads: Vec<CollectedSpread>,
    /// Every type set reached with the possible types it applies to, in first-seen order. The
    /// type set of the position itself comes first.
    pub(crate) type_sets: IndexMap<TypeSet, IndexSet<Name>>,
}

impl<'doc> CollectedSelections<'doc> {
    /// The fields that apply to every object of the given type set.
    pub(crate) fn fields_within<'a>(
        &'a self,
        type_set: &'a TypeSet,
    ) -> impl Iterator<Item = &'a CollectedField<'doc>> {
        self.fields
            .iter()
            .filter(move |field| field.type_set.is_subset(type_set))
    }

    /// The first spread of every fragment that applies to every object of the given type set.
    pub(crate) fn spreads_within<'a>(
        &'a self,
        type_set: &'a TypeSet,
    ) -> impl Iterator<Item = &'a CollectedSpread> {
        let mut seen = IndexSet::<&Name>::default();
        self.spreads.iter().filter(move |spread| {
            spread.type_set.is_subset(type_set) && seen.insert(&spread.fragment_name)
        })
    }

    /// The first spread of every fragment, in traversal order.
    pub(crate) fn distinct_spreads(&self) -> Vec<&CollectedSpread> {
        let mut seen = IndexSet::<&Name>::default();
        self.spreads
            .iter()
            .filter(|spread| seen.insert(&spread.fragment_name))
            .collect()
    }
}

/// Collects the selections at one position.
///
/// `selection_sets` are the sub-selections of every merged instance of the field at this
/// position (or the root selection set), all of type `parent_type`.
pub(crate) fn collect_selections<'doc>(
    ctx: &BuildContext<'doc>,
    usage: &mut Usage,
    parent_type: &'doc Name,
    possible_types: &IndexSet<Name>,
    selection_sets: &[&'doc SelectionSet],
) -> Result<CollectedSelections<'doc>, IrError> {
    let type_set = TypeSet::new(parent_type.clone());
    let mut collected = CollectedSelections::default();
    collected
        .type_sets
        .insert(type_set.clone(), possible_types.clone());
    let context = CollectContext {
        ctx,
        type_set,
        possible_types: possible_types.clone(),
        condition: BooleanExpression::True,
    };
    for selection_set in selection_sets {
        context.process_selection_set(&mut collected, usage, selection_set)?;
    }
    Ok(collected)
}

struct CollectContext<'ctx, 'doc> {
    ctx: &'ctx BuildContext<'doc>,
    type_set: TypeSet,             // accumulated type conditions down from the position
    possible_types: IndexSet<Name>, // objects the current selection set can apply to
    condition: BooleanExpression<BVariable>, // accumulated conditions down from the position
}

impl<'doc> CollectContext<'_, 'doc> {
    fn process_selection_set(
        &self,
        collected: &mut CollectedSelections<'doc>,
        usage: &mut Usage,
        selection_set: &'doc SelectionSet,
    ) -> Result<(), IrError> {
        for selection in &selection_set.selections {
            match selection {
                Selection::Field(field) => {
                    let condition = self
                        .condition
                        .clone()
                        .and(BooleanExpression::from_directives(&field.directives)?);
                    if condition.is_false() {
                        continue;
                    }
                    usage.record_field_selection(self.ctx.schema, &selection_set.ty, field)?;
                    collected.fields.push(CollectedField {
                        type_set: self.type_set.clone(),
                        instance: FieldInstance {
                            field,
                            parent_type: &selection_set.ty,
                            condition,
                        },
                    });
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.ctx.fragment(&spread.fragment_name)?;
                    self.process_fragment(
                        collected,
                        usage,
                        fragment.type_condition(),
                        &spread.directives,
                        &fragment.selection_set,
                        Some(&spread.fragment_name),
                    )?;
                }
                Selection::InlineFragment(inline) => {
                    let type_condition = inline
                        .type_condition
                        .as_ref()
                        .unwrap_or(&selection_set.ty);
                    self.process_fragment(
                        collected,
                        usage,
                        type_condition,
                        &inline.directives,
                        &inline.selection_set,
                        None,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// For both inline fragments and fragment spreads
    fn process_fragment(
        &self,
        collected: &mut CollectedSelections<'doc>,
        usage: &mut Usage,
        type_condition: &Name,
        directives: &ast::DirectiveList,
        selection_set: &'doc SelectionSet,
        fragment_name: Option<&Name>,
    ) -> Result<(), IrError> {
        let condition = self
            .condition
            .clone()
            .and(BooleanExpression::from_directives(directives)?);
        if condition.is_false() {
            return Ok(());
        }
        let fragment_possible_types = self.ctx.schema.possible_types(type_condition)?;
        let possible_types: IndexSet<Name> = self
            .possible_types
            .iter()
            .filter(|ty| fragment_possible_types.contains(*ty))
            .cloned()
            .collect();
        if possible_types.is_empty() {
            // Unreachable type condition => skip
            return Ok(());
        }
        usage.record_type(type_condition);
        usage.record_types(&possible_types);

        // A type condition that every current possible type satisfies does not narrow anything.
        let type_set = if possible_types.len() == self.possible_types.len() {
            self.type_set.clone()
        } else {
            self.type_set.with(type_condition)
        };
        collected
            .type_sets
            .entry(type_set.clone())
            .or_insert_with(|| possible_types.clone());
        if let Some(fragment_name) = fragment_name {
            collected.spreads.push(CollectedSpread {
                fragment_name: fragment_name.clone(),
                type_set: type_set.clone(),
            });
        }

        let context = CollectContext {
            ctx: self.ctx,
            type_set,
            possible_types,
            condition,
        };
        context.process_selection_set(collected, usage, selection_set)
    }
}
