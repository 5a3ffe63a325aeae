//! Operation-based models mirror the documents: one concrete model per selection set.
//!
//! Fields become properties. Inline fragments, grouped by type condition, become synthetic
//! `on<Type>` properties holding a nested model, and named fragment spreads become synthetic
//! properties holding the fragment's data model. Synthetic properties can only be read once the
//! whole object has been seen, so they require buffering.
use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;

use super::BuildContext;
use super::ModelIds;
use super::field_merger::FieldInstance;
use super::field_merger::MergedField;
use super::field_merger::merge_field_instances;
use super::fragment_data_model_id;
use super::synthetic_property;
use super::usage::Usage;
use crate::conditions::BTerm;
use crate::conditions::BVariable;
use crate::conditions::BooleanExpression;
use crate::error::IrError;
use crate::ir::IrModel;
use crate::ir::IrModelGroup;
use crate::ir::IrProperty;
use crate::ir::IrType;
use crate::ir::TypeSet;

pub(crate) struct OperationBasedBuilder<'ctx, 'doc> {
    ctx: &'ctx BuildContext<'doc>,
    usage: &'ctx mut Usage,
    ids: ModelIds,
}

#[derive(PartialEq, Eq, Hash)]
enum PendingKey<'doc> {
    Field(&'doc Name),
    Inline(&'doc Name),
    Spread(&'doc Name),
}

enum PendingProperty<'doc> {
    Field(Vec<FieldInstance<'doc>>),
    Inline {
        type_condition: &'doc Name,
        conditions: Vec<BooleanExpression<BVariable>>,
        selection_sets: Vec<&'doc SelectionSet>,
    },
    Spread {
        fragment_name: &'doc Name,
        conditions: Vec<BooleanExpression<BVariable>>,
    },
}

impl<'ctx, 'doc> OperationBasedBuilder<'ctx, 'doc> {
    pub(crate) fn new(ctx: &'ctx BuildContext<'doc>, usage: &'ctx mut Usage, root_id: &str) -> Self {
        Self {
            ctx,
            usage,
            ids: ModelIds::new(root_id, ctx.config.flatten_models),
        }
    }

    pub(crate) fn build(
        mut self,
        name: &str,
        selection_set: &'doc SelectionSet,
    ) -> Result<IrModelGroup, IrError> {
        let possible_types = self.ctx.schema.possible_types(&selection_set.ty)?.clone();
        let root_id = self.ids.root().to_owned();
        let group = self.build_group(
            root_id,
            name.to_owned(),
            &selection_set.ty,
            &possible_types,
            &[selection_set],
        )?;
        Ok(self.ids.finish(group))
    }

    fn build_group(
        &mut self,
        id: String,
        name: String,
        ty: &Name,
        possible_types: &IndexSet<Name>,
        sources: &[&'doc SelectionSet],
    ) -> Result<IrModelGroup, IrError> {
        let mut pending: IndexMap<PendingKey<'doc>, PendingProperty<'doc>> = IndexMap::default();
        for source in sources {
            for selection in &source.selections {
                match selection {
                    Selection::Field(field) => {
                        let instance = FieldInstance {
                            field,
                            parent_type: &source.ty,
                            condition: BooleanExpression::from_directives(&field.directives)?,
                        };
                        if let PendingProperty::Field(instances) = pending
                            .entry(PendingKey::Field(field.response_key()))
                            .or_insert_with(|| PendingProperty::Field(vec![]))
                        {
                            instances.push(instance);
                        }
                    }
                    Selection::InlineFragment(inline) => {
                        let type_condition = inline.type_condition.as_ref().unwrap_or(&source.ty);
                        let condition = BooleanExpression::from_directives(&inline.directives)?;
                        if let PendingProperty::Inline {
                            conditions,
                            selection_sets,
                            ..
                        } = pending
                            .entry(PendingKey::Inline(type_condition))
                            .or_insert_with(|| PendingProperty::Inline {
                                type_condition,
                                conditions: vec![],
                                selection_sets: vec![],
                            })
                        {
                            conditions.push(condition);
                            selection_sets.push(&inline.selection_set);
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        let condition = BooleanExpression::from_directives(&spread.directives)?;
                        if let PendingProperty::Spread { conditions, .. } = pending
                            .entry(PendingKey::Spread(&spread.fragment_name))
                            .or_insert_with(|| PendingProperty::Spread {
                                fragment_name: &spread.fragment_name,
                                conditions: vec![],
                            })
                        {
                            conditions.push(condition);
                        }
                    }
                }
            }
        }

        let mut properties = Vec::with_capacity(pending.len());
        let mut model_groups = vec![];
        for pending in pending.into_values() {
            let property = match pending {
                PendingProperty::Field(instances) => {
                    let merged = merge_field_instances(&instances)?;
                    self.field_property(&id, &merged, &mut model_groups)?
                }
                PendingProperty::Inline {
                    type_condition,
                    conditions,
                    selection_sets,
                } => {
                    let (narrowed, condition) =
                        self.fragment_condition(possible_types, type_condition, conditions)?;
                    let property_name = format!("on{type_condition}");
                    let child_id = self.ids.child_id(&id, &property_name);
                    let slot = self.ids.reserve();
                    let group = self.build_group(
                        child_id.clone(),
                        property_name.clone(),
                        type_condition,
                        &narrowed,
                        &selection_sets,
                    )?;
                    self.ids.place(slot, group, &mut model_groups);
                    synthetic_property(&property_name, IrType::Model(child_id), condition)?
                }
                PendingProperty::Spread {
                    fragment_name,
                    conditions,
                } => {
                    let fragment = self.ctx.fragment(fragment_name)?;
                    let (_, condition) = self.fragment_condition(
                        possible_types,
                        fragment.type_condition(),
                        conditions,
                    )?;
                    synthetic_property(
                        fragment_name,
                        IrType::Model(fragment_data_model_id(fragment_name)),
                        condition,
                    )?
                }
            };
            properties.push(property);
        }

        let model = IrModel {
            name,
            id: id.clone(),
            type_set: TypeSet::new(ty.clone()),
            properties,
            possible_types: possible_types.iter().cloned().collect(),
            accessors: vec![],
            implements: vec![],
            model_groups,
            is_interface: false,
            is_fallback: false,
        };
        Ok(IrModelGroup {
            base_model_id: id,
            models: vec![model],
        })
    }

    fn field_property(
        &mut self,
        model_id: &str,
        merged: &MergedField<'doc>,
        model_groups: &mut Vec<IrModelGroup>,
    ) -> Result<IrProperty, IrError> {
        let field = merged.representative;
        self.usage
            .record_field_selection(self.ctx.schema, merged.parent_type, field)?;
        let leaf_type = field.ty().inner_named_type();
        let child_id = if self.ctx.schema.type_kind(leaf_type)?.is_composite() {
            let child_id = self.ids.child_id(model_id, merged.response_name());
            let possible_types = self.ctx.schema.possible_types(leaf_type)?.clone();
            let slot = self.ids.reserve();
            let group = self.build_group(
                child_id.clone(),
                merged.response_name().to_string(),
                leaf_type,
                &possible_types,
                &merged.child_selection_sets,
            )?;
            self.ids.place(slot, group, model_groups);
            Some(child_id)
        } else {
            None
        };
        super::field_property(self.ctx, merged, child_id.as_deref(), false)
    }

    /// The possible types a fragment applies to, and the condition of the property holding it.
    /// The condition tests the runtime type unless the fragment applies to every possible type.
    fn fragment_condition(
        &mut self,
        possible_types: &IndexSet<Name>,
        type_condition: &Name,
        conditions: Vec<BooleanExpression<BVariable>>,
    ) -> Result<(IndexSet<Name>, BooleanExpression<BTerm>), IrError> {
        let narrowed = self
            .ctx
            .schema
            .possible_types_within(type_condition, possible_types)?;
        self.usage.record_type(type_condition);
        self.usage.record_types(&narrowed);
        let type_term = if narrowed.len() == possible_types.len() {
            BooleanExpression::True
        } else {
            BooleanExpression::possible_types(narrowed.iter().cloned().collect())
        };
        let condition = BooleanExpression::any(conditions)
            .into_term_expression()
            .and(type_term);
        Ok((narrowed, condition))
    }
}
