//! Compiles the selection sets of one operation or fragment.
//!
//! Fields with the same response name in one selection set are merged, spreads of the same
//! fragment are merged, and inline fragments with the same type condition and condition are
//! merged. Every selection set gets a name unique within its root: `__root` for the root
//! selection set, `__<responseName>` for fields and `__on<Type>` for inline fragments, with a
//! numeric suffix when a name is already taken.
use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;

use super::BuildContext;
use super::field_merger::FieldInstance;
use super::field_merger::merge_field_instances;
use super::usage::Usage;
use crate::conditions::BVariable;
use crate::conditions::BooleanExpression;
use crate::error::IrError;
use crate::ir::IrField;
use crate::ir::IrFragment;
use crate::ir::IrFragmentKind;
use crate::ir::IrSelection;
use crate::ir::IrSelectionSet;

pub(crate) const ROOT_SELECTION_SET_NAME: &str = "__root";

/// Hands out names that are unique within one root. Names are never reused.
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    used: IndexSet<String>,
}

impl NameAllocator {
    pub(crate) fn allocate(&mut self, base: &str) -> String {
        let mut name = base.to_owned();
        let mut suffix = 1;
        while self.used.contains(&name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

pub(crate) struct SelectionSetsBuilder<'ctx, 'doc> {
    ctx: &'ctx BuildContext<'doc>,
    usage: &'ctx mut Usage,
    names: NameAllocator,
    selection_sets: Vec<IrSelectionSet>,
}

/// Selections of one selection set, before merging, in order of first appearance.
enum PendingSelection<'doc> {
    Field(Vec<FieldInstance<'doc>>),
    Spread {
        fragment_name: &'doc Name,
        conditions: Vec<BooleanExpression<BVariable>>,
    },
    Inline {
        type_condition: &'doc Name,
        condition: BooleanExpression<BVariable>,
        selection_sets: Vec<&'doc SelectionSet>,
    },
}

#[derive(PartialEq, Eq, Hash)]
enum PendingKey<'doc> {
    Field(&'doc Name),
    Spread(&'doc Name),
    Inline(&'doc Name, BooleanExpression<BVariable>),
}

impl<'ctx, 'doc> SelectionSetsBuilder<'ctx, 'doc> {
    pub(crate) fn new(ctx: &'ctx BuildContext<'doc>, usage: &'ctx mut Usage) -> Self {
        Self {
            ctx,
            usage,
            names: NameAllocator::default(),
            selection_sets: vec![],
        }
    }

    /// Returns the selection sets in pre-order, the root selection set first.
    pub(crate) fn build(
        mut self,
        root: &'doc SelectionSet,
    ) -> Result<Vec<IrSelectionSet>, IrError> {
        let name = self.names.allocate(ROOT_SELECTION_SET_NAME);
        let possible_types = self.ctx.schema.possible_types(&root.ty)?.clone();
        self.build_selection_set(name, true, &possible_types, &[root])?;
        Ok(self.selection_sets)
    }

    fn build_selection_set(
        &mut self,
        name: String,
        is_root: bool,
        possible_types: &IndexSet<Name>,
        sources: &[&'doc SelectionSet],
    ) -> Result<(), IrError> {
        // Reserve the slot of this selection set so that parents come before their children.
        let index = self.selection_sets.len();
        self.selection_sets.push(IrSelectionSet {
            name,
            is_root,
            selections: vec![],
        });

        let mut pending: IndexMap<PendingKey<'doc>, PendingSelection<'doc>> = IndexMap::default();
        for source in sources {
            for selection in &source.selections {
                match selection {
                    Selection::Field(field) => {
                        let instance = FieldInstance {
                            field,
                            parent_type: &source.ty,
                            condition: BooleanExpression::from_directives(&field.directives)?,
                        };
                        match pending
                            .entry(PendingKey::Field(field.response_key()))
                            .or_insert_with(|| PendingSelection::Field(vec![]))
                        {
                            PendingSelection::Field(instances) => instances.push(instance),
                            _ => crate::bail!("selection kinds are keyed separately"),
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        let condition = BooleanExpression::from_directives(&spread.directives)?;
                        match pending
                            .entry(PendingKey::Spread(&spread.fragment_name))
                            .or_insert_with(|| PendingSelection::Spread {
                                fragment_name: &spread.fragment_name,
                                conditions: vec![],
                            }) {
                            PendingSelection::Spread { conditions, .. } => {
                                conditions.push(condition)
                            }
                            _ => crate::bail!("selection kinds are keyed separately"),
                        }
                    }
                    Selection::InlineFragment(inline) => {
                        let type_condition = inline.type_condition.as_ref().unwrap_or(&source.ty);
                        let condition = BooleanExpression::from_directives(&inline.directives)?;
                        match pending
                            .entry(PendingKey::Inline(type_condition, condition.clone()))
                            .or_insert_with(|| PendingSelection::Inline {
                                type_condition,
                                condition,
                                selection_sets: vec![],
                            }) {
                            PendingSelection::Inline { selection_sets, .. } => {
                                selection_sets.push(&inline.selection_set)
                            }
                            _ => crate::bail!("selection kinds are keyed separately"),
                        }
                    }
                }
            }
        }

        let mut selections = Vec::with_capacity(pending.len());
        for pending in pending.into_values() {
            selections.push(match pending {
                PendingSelection::Field(instances) => {
                    IrSelection::Field(self.build_field(&instances)?)
                }
                PendingSelection::Spread {
                    fragment_name,
                    conditions,
                } => {
                    let fragment = self.ctx.fragment(fragment_name)?;
                    let type_condition = fragment.type_condition();
                    self.usage.record_type(type_condition);
                    IrSelection::Fragment(IrFragment {
                        type_condition: type_condition.clone(),
                        possible_types: self.narrow(possible_types, type_condition)?,
                        condition: BooleanExpression::any(conditions),
                        kind: IrFragmentKind::Spread {
                            name: fragment_name.clone(),
                        },
                    })
                }
                PendingSelection::Inline {
                    type_condition,
                    condition,
                    selection_sets,
                } => {
                    let narrowed = self.narrow(possible_types, type_condition)?;
                    self.usage.record_type(type_condition);
                    let name = self.names.allocate(&format!("__on{type_condition}"));
                    self.build_selection_set(
                        name.clone(),
                        false,
                        &narrowed.iter().cloned().collect::<IndexSet<Name>>(),
                        &selection_sets,
                    )?;
                    IrSelection::Fragment(IrFragment {
                        type_condition: type_condition.clone(),
                        possible_types: narrowed,
                        condition,
                        kind: IrFragmentKind::Inline {
                            selection_set_name: name,
                        },
                    })
                }
            });
        }
        if let Some(selection_set) = self.selection_sets.get_mut(index) {
            selection_set.selections = selections;
        }
        Ok(())
    }

    fn build_field(&mut self, instances: &[FieldInstance<'doc>]) -> Result<IrField, IrError> {
        let merged = merge_field_instances(instances)?;
        let field = merged.representative;
        let resolver = self.ctx.resolver();
        let ty = resolver.resolve(field.ty())?;
        self.usage
            .record_field_selection(self.ctx.schema, merged.parent_type, field)?;

        let selection_set_name = if self.ctx.schema.type_kind(ty.leaf_name())?.is_composite() {
            let name = self.names.allocate(&format!("__{}", merged.response_name()));
            let possible_types = self.ctx.schema.possible_types(ty.leaf_name())?.clone();
            self.build_selection_set(
                name.clone(),
                false,
                &possible_types,
                &merged.child_selection_sets,
            )?;
            Some(name)
        } else {
            None
        };

        Ok(IrField {
            name: field.name.clone(),
            alias: field.alias.clone(),
            ty,
            condition: merged.condition.clone(),
            arguments: merged.arguments(),
            selection_set_name,
        })
    }

    /// The possible types of `type_condition` among `possible_types`, in their order.
    fn narrow(
        &mut self,
        possible_types: &IndexSet<Name>,
        type_condition: &Name,
    ) -> Result<Vec<Name>, IrError> {
        let narrowed: Vec<Name> = self
            .ctx
            .schema
            .possible_types_within(type_condition, possible_types)?
            .into_iter()
            .collect();
        self.usage.record_types(&narrowed);
        Ok(narrowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_names_get_a_numeric_suffix() {
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate("__root"), "__root");
        assert_eq!(names.allocate("__hero"), "__hero");
        assert_eq!(names.allocate("__hero"), "__hero1");
        assert_eq!(names.allocate("__hero"), "__hero2");
        assert_eq!(names.allocate("__hero1"), "__hero11");
    }
}
