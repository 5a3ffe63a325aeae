//! Response-based models follow the possible shapes of the response rather than the documents.
//!
//! At every position, the selections reachable through fragments are collected with their type
//! sets. Each possible type gets the union of the type sets that apply to it (its shape) and one
//! concrete model is generated per shape. When a position has several shapes, the base model and
//! every type set that other shapes refine become interfaces, and a fallback model covers the
//! types no refinement matched, including the ones the schema may gain later.
use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable::SelectionSet;
use tracing::trace;

use super::BuildContext;
use super::ModelIds;
use super::accessors::synthesize_accessors;
use super::collect::CollectedSelections;
use super::collect::collect_selections;
use super::field_merger::MergedField;
use super::field_merger::group_by_response_name;
use super::field_merger::merge_field_instances;
use super::fragment_interface_model_id;
use super::fragments::FragmentFacts;
use super::usage::Usage;
use crate::error::IrError;
use crate::ir::IrModel;
use crate::ir::IrModelGroup;
use crate::ir::IrProperty;
use crate::ir::TypeSet;

const FALLBACK_ID_SUFFIX: &str = "#other";

pub(crate) struct ResponseBasedBuilder<'ctx, 'doc> {
    ctx: &'ctx BuildContext<'doc>,
    usage: &'ctx mut Usage,
    fragments: &'ctx mut FragmentFacts,
    ids: ModelIds,
    /// Every model is an interface and no fallback is generated.
    interfaces_only: bool,
    /// The interface tree, built from the same selections, whose models this tree implements.
    own_interface: Option<&'ctx IrModelGroup>,
}

impl<'ctx, 'doc> ResponseBasedBuilder<'ctx, 'doc> {
    pub(crate) fn new(
        ctx: &'ctx BuildContext<'doc>,
        usage: &'ctx mut Usage,
        fragments: &'ctx mut FragmentFacts,
        root_id: &str,
    ) -> Self {
        Self {
            ctx,
            usage,
            fragments,
            ids: ModelIds::new(root_id, ctx.config.flatten_models),
            interfaces_only: false,
            own_interface: None,
        }
    }

    pub(crate) fn interfaces_only(mut self) -> Self {
        self.interfaces_only = true;
        self
    }

    /// Makes every model implement its counterpart in `interface_group`, a tree built from the
    /// same selections with interfaces only.
    pub(crate) fn implementing(mut self, interface_group: &'ctx IrModelGroup) -> Self {
        self.own_interface = Some(interface_group);
        self
    }

    pub(crate) fn build(
        mut self,
        name: &str,
        selection_set: &'doc SelectionSet,
    ) -> Result<IrModelGroup, IrError> {
        let possible_types = self.ctx.schema.possible_types(&selection_set.ty)?.clone();
        let root_id = self.ids.root().to_owned();
        let counterpart_root = self
            .own_interface
            .map(|interface_group| interface_group.base_model_id.clone());
        let group = self.build_group(
            root_id,
            name.to_owned(),
            &selection_set.ty,
            &possible_types,
            &[selection_set],
            counterpart_root,
        )?;
        Ok(self.ids.finish(group))
    }

    fn build_group(
        &mut self,
        id: String,
        name: String,
        ty: &'doc Name,
        possible_types: &IndexSet<Name>,
        sources: &[&'doc SelectionSet],
        counterpart_root: Option<String>,
    ) -> Result<IrModelGroup, IrError> {
        let collected = collect_selections(self.ctx, self.usage, ty, possible_types, sources)?;
        let mut models = plan_models(
            &id,
            &name,
            ty,
            possible_types,
            &collected.type_sets,
            self.interfaces_only,
        );
        trace!(
            model_id = %id,
            type_sets = collected.type_sets.len(),
            models = models.len(),
            "split response shapes"
        );

        for index in 0..models.len() {
            let counterpart = counterpart_root
                .as_deref()
                .and_then(|root| self.counterpart(root, &id, &models[index].id));
            let mut implements = vec![];
            if let Some(counterpart) = counterpart {
                implements.push(counterpart.id.clone());
            }
            implements.extend(self.implements(&models, index, &collected));
            let mut overridden = IndexSet::<Name>::default();
            for other in &models {
                if implements.contains(&other.id) {
                    overridden.extend(
                        collected
                            .fields_within(&other.type_set)
                            .map(|field| field.instance.response_name().clone()),
                    );
                }
            }
            if self.fragment_interfaces_enabled() {
                for spread in collected.spreads_within(&models[index].type_set) {
                    overridden.extend(
                        self.fragments
                            .interface_fields(self.ctx, &spread.fragment_name)?
                            .iter()
                            .cloned(),
                    );
                }
            }

            let model_id = models[index].id.clone();
            let type_set = models[index].type_set.clone();
            let mut properties = vec![];
            let mut model_groups = vec![];
            let instances = collected
                .fields_within(&type_set)
                .map(|field| field.instance.clone());
            for (response_name, instances) in group_by_response_name(instances) {
                let merged = merge_field_instances(&instances)?;
                let counterpart_property =
                    counterpart.and_then(|counterpart| counterpart.property(&response_name));
                let is_override =
                    counterpart_property.is_some() || overridden.contains(&response_name);
                let child_counterpart_root = counterpart_property
                    .and_then(|property| property.info.ty.model_id())
                    .map(str::to_owned);
                properties.push(self.field_property(
                    &model_id,
                    &merged,
                    is_override,
                    child_counterpart_root,
                    &mut model_groups,
                )?);
            }

            let model = &mut models[index];
            model.implements = implements;
            model.properties = properties;
            model.model_groups = model_groups;
        }

        let spreads = if self.fragment_interfaces_enabled() {
            collected.distinct_spreads()
        } else {
            vec![]
        };
        synthesize_accessors(&mut models, &spreads)?;
        Ok(IrModelGroup {
            base_model_id: id,
            models,
        })
    }

    fn fragment_interfaces_enabled(&self) -> bool {
        self.ctx.config.codegen_models.generates_fragment_interfaces()
    }

    /// The model of the interface tree that `model_id`, in the group `group_id`, corresponds to.
    /// Concrete counterparts and fallbacks correspond to the interface with their type set.
    fn counterpart(
        &self,
        counterpart_root: &str,
        group_id: &str,
        model_id: &str,
    ) -> Option<&'ctx IrModel> {
        let interface_group = self.own_interface?;
        let refinement = model_id.strip_prefix(group_id)?;
        let counterpart_id = format!(
            "{counterpart_root}{}",
            refinement
                .strip_suffix(FALLBACK_ID_SUFFIX)
                .unwrap_or(refinement)
        );
        interface_group
            .all_models()
            .into_iter()
            .find(|model| model.id == counterpart_id)
    }

    /// The ids of the in-group interfaces a model refines, then of the interfaces of the
    /// fragments applying to all of its objects.
    fn implements(
        &self,
        models: &[IrModel],
        index: usize,
        collected: &CollectedSelections<'doc>,
    ) -> Vec<String> {
        let model = &models[index];
        let mut implements = vec![];
        implements.extend(
            models
                .iter()
                .filter(|other| {
                    other.is_interface
                        && other.id != model.id
                        && (other.type_set.is_strict_subset(&model.type_set)
                            || (!model.is_interface && other.type_set == model.type_set))
                })
                .map(|other| other.id.clone()),
        );
        if self.fragment_interfaces_enabled() {
            for spread in collected.spreads_within(&model.type_set) {
                let interface_id = fragment_interface_model_id(&spread.fragment_name);
                if !implements.contains(&interface_id) {
                    implements.push(interface_id);
                }
            }
        }
        implements
    }

    fn field_property(
        &mut self,
        model_id: &str,
        merged: &MergedField<'doc>,
        is_override: bool,
        counterpart_root: Option<String>,
        model_groups: &mut Vec<IrModelGroup>,
    ) -> Result<IrProperty, IrError> {
        let leaf_type = merged.representative.ty().inner_named_type();
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
                counterpart_root,
            )?;
            self.ids.place(slot, group, model_groups);
            Some(child_id)
        } else {
            None
        };
        super::field_property(self.ctx, merged, child_id.as_deref(), is_override)
    }
}

/// Decides the models of one group from the type sets collected at its position. Properties,
/// implemented interfaces and accessors are filled in later.
///
/// Models come in this order: the base model, the intermediate interfaces, the concrete models
/// in order of the first possible type of their shape, and the fallback.
fn plan_models(
    id: &str,
    name: &str,
    ty: &Name,
    possible_types: &IndexSet<Name>,
    type_sets: &IndexMap<TypeSet, IndexSet<Name>>,
    interfaces_only: bool,
) -> Vec<IrModel> {
    let base = TypeSet::new(ty.clone());
    let shape_of: Vec<(&Name, TypeSet)> = possible_types
        .iter()
        .map(|possible_type| {
            let shape = type_sets
                .iter()
                .filter(|(_, applies_to)| applies_to.contains(possible_type))
                .fold(base.clone(), |shape, (type_set, _)| shape.union(type_set));
            (possible_type, shape)
        })
        .collect();
    let mut shapes: IndexMap<TypeSet, Vec<Name>> = IndexMap::default();
    for (possible_type, shape) in &shape_of {
        shapes
            .entry(shape.clone())
            .or_default()
            .push((*possible_type).clone());
    }

    let model = |model_id: String, model_name: String, type_set: TypeSet, types: Vec<Name>| {
        IrModel {
            name: model_name,
            id: model_id,
            type_set,
            properties: vec![],
            possible_types: types,
            accessors: vec![],
            implements: vec![],
            model_groups: vec![],
            is_interface: false,
            is_fallback: false,
        }
    };

    if shapes.len() <= 1 {
        let mut base_model = model(
            id.to_owned(),
            name.to_owned(),
            base,
            possible_types.iter().cloned().collect(),
        );
        base_model.is_interface = interfaces_only;
        return vec![base_model];
    }

    // A type set becomes an interface when another shape refines it.
    let mut interface_sets = IndexSet::<TypeSet>::default();
    interface_sets.insert(base.clone());
    for type_set in type_sets.keys() {
        if interfaces_only || shapes.keys().any(|shape| type_set.is_strict_subset(shape)) {
            interface_sets.insert(type_set.clone());
        }
    }
    if interfaces_only {
        interface_sets.extend(shapes.keys().cloned());
    }

    let mut models: Vec<IrModel> = interface_sets
        .iter()
        .map(|type_set| {
            let types = shape_of
                .iter()
                .filter(|(_, shape)| type_set.is_subset(shape))
                .map(|(possible_type, _)| (*possible_type).clone())
                .collect();
            let mut interface = if *type_set == base {
                model(id.to_owned(), name.to_owned(), base.clone(), types)
            } else {
                model(
                    format!("{id}#{type_set}"),
                    refinement_name(type_set, ty),
                    type_set.clone(),
                    types,
                )
            };
            interface.is_interface = true;
            interface
        })
        .collect();
    if interfaces_only {
        return models;
    }

    for (shape, types) in &shapes {
        if *shape == base {
            continue;
        }
        models.push(if interface_sets.contains(shape) {
            model(
                format!("{id}#{shape}{FALLBACK_ID_SUFFIX}"),
                format!("Other{}", refinement_name(shape, ty)),
                shape.clone(),
                types.clone(),
            )
        } else {
            model(
                format!("{id}#{shape}"),
                refinement_name(shape, ty),
                shape.clone(),
                types.clone(),
            )
        });
    }
    let mut fallback = model(
        format!("{id}{FALLBACK_ID_SUFFIX}"),
        "Other".to_owned(),
        base.clone(),
        shapes.get(&base).cloned().unwrap_or_default(),
    );
    fallback.is_fallback = true;
    models.push(fallback);
    models
}

/// Refinements are named after the type conditions they add to the position's type.
fn refinement_name(type_set: &TypeSet, ty: &Name) -> String {
    type_set
        .types()
        .iter()
        .filter(|condition| *condition != ty)
        .map(|condition| condition.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    fn type_set(types: &[&str]) -> TypeSet {
        types.iter().map(|ty| Name::new(ty).unwrap()).collect()
    }

    fn names(types: &[&str]) -> IndexSet<Name> {
        types.iter().map(|ty| Name::new(ty).unwrap()).collect()
    }

    fn describe(models: &[IrModel]) -> Vec<String> {
        models
            .iter()
            .map(|model| {
                let kind = if model.is_fallback {
                    "fallback"
                } else if model.is_interface {
                    "interface"
                } else {
                    "model"
                };
                format!(
                    "{kind} {} {} [{}]",
                    model.name,
                    model.id,
                    model.possible_types.iter().map(|ty| ty.as_str()).collect::<Vec<_>>().join(",")
                )
            })
            .collect()
    }

    #[test]
    fn a_single_shape_stands_alone() {
        let mut type_sets = IndexMap::default();
        type_sets.insert(type_set(&["Node"]), names(&["Cat", "Dog"]));
        let models = plan_models(
            "q",
            "node",
            &name!("Node"),
            &names(&["Cat", "Dog"]),
            &type_sets,
            false,
        );
        assert_eq!(describe(&models), ["model node q [Cat,Dog]"]);
    }

    #[test]
    fn disjoint_refinements_get_a_fallback() {
        let mut type_sets = IndexMap::default();
        type_sets.insert(type_set(&["Node"]), names(&["Cat", "Dog", "Bird"]));
        type_sets.insert(type_set(&["Cat", "Node"]), names(&["Cat"]));
        type_sets.insert(type_set(&["Dog", "Node"]), names(&["Dog"]));
        let models = plan_models(
            "q",
            "node",
            &name!("Node"),
            &names(&["Cat", "Dog", "Bird"]),
            &type_sets,
            false,
        );
        assert_eq!(
            describe(&models),
            [
                "interface node q [Cat,Dog,Bird]",
                "model Cat q#Cat&Node [Cat]",
                "model Dog q#Dog&Node [Dog]",
                "fallback Other q#other [Bird]",
            ]
        );
    }

    #[test]
    fn refined_shapes_get_a_concrete_counterpart() {
        let mut type_sets = IndexMap::default();
        type_sets.insert(type_set(&["Node"]), names(&["Cat", "Dog", "Bird"]));
        type_sets.insert(type_set(&["Named", "Node"]), names(&["Cat", "Dog"]));
        type_sets.insert(type_set(&["Cat", "Named", "Node"]), names(&["Cat"]));
        let models = plan_models(
            "q",
            "node",
            &name!("Node"),
            &names(&["Cat", "Dog", "Bird"]),
            &type_sets,
            false,
        );
        assert_eq!(
            describe(&models),
            [
                "interface node q [Cat,Dog,Bird]",
                "interface Named q#Named&Node [Cat,Dog]",
                "model CatNamed q#Cat&Named&Node [Cat]",
                "model OtherNamed q#Named&Node#other [Dog]",
                "fallback Other q#other [Bird]",
            ]
        );

        let interfaces = plan_models(
            "q",
            "node",
            &name!("Node"),
            &names(&["Cat", "Dog", "Bird"]),
            &type_sets,
            true,
        );
        assert_eq!(
            describe(&interfaces),
            [
                "interface node q [Cat,Dog,Bird]",
                "interface Named q#Named&Node [Cat,Dog]",
                "interface CatNamed q#Cat&Named&Node [Cat]",
            ]
        );
    }

    #[test]
    fn fallback_exists_even_when_every_type_is_refined() {
        let mut type_sets = IndexMap::default();
        type_sets.insert(type_set(&["Node"]), names(&["Cat", "Dog"]));
        type_sets.insert(type_set(&["Cat", "Node"]), names(&["Cat"]));
        type_sets.insert(type_set(&["Dog", "Node"]), names(&["Dog"]));
        let models = plan_models(
            "q",
            "node",
            &name!("Node"),
            &names(&["Cat", "Dog"]),
            &type_sets,
            false,
        );
        assert_eq!(describe(&models)[3], "fallback Other q#other []");
    }
}
