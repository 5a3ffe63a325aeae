//! Checks run on every root after it is built. A failure is a bug in the builder, never in the
//! documents, so everything reported here is an internal consistency error.
use apollo_compiler::collections::IndexSet;

use crate::error::IrError;
use crate::error::MultipleIrErrors;
use super::fragment_interface_model_id;
use crate::internal_error;
use crate::ir::IrAccessor;
use crate::ir::IrModelGroup;
use crate::ir::IrSelectionSet;

pub(crate) fn check_selection_sets(selection_sets: &[IrSelectionSet]) -> Result<(), IrError> {
    let mut errors = MultipleIrErrors::new();
    let mut names = IndexSet::default();
    for selection_set in selection_sets {
        if !names.insert(selection_set.name.as_str()) {
            errors.push(internal_error!(
                "duplicate selection set name \"{}\"",
                selection_set.name
            ));
        }
    }
    if selection_sets.iter().filter(|set| set.is_root).count() != 1 {
        errors.push(internal_error!("expected exactly one root selection set"));
    }
    errors.into_result()
}

/// Model ids are unique within one tree, and every accessor target, implemented interface and
/// model-typed property resolves to a model of the tree or to one of `fragment_models`, the
/// models generated for fragments. Fragment accessors address the interface of their fragment.
pub(crate) fn check_model_group(
    group: &IrModelGroup,
    fragment_models: &IndexSet<String>,
) -> Result<(), IrError> {
    let mut errors = MultipleIrErrors::new();
    let models = group.all_models();
    let mut ids = IndexSet::default();
    for model in &models {
        if !ids.insert(model.id.as_str()) {
            errors.push(internal_error!("duplicate model id \"{}\"", model.id));
        }
    }
    if group.base_model().map(|model| model.id.as_str()) != Some(group.base_model_id.as_str()) {
        errors.push(internal_error!(
            "group \"{}\" does not start with its base model",
            group.base_model_id
        ));
    }
    let resolves = |id: &str| ids.contains(id) || fragment_models.contains(id);
    for model in &models {
        for accessor in &model.accessors {
            let returned_model_id = accessor.returned_model_id();
            let expected = match accessor {
                IrAccessor::Fragment { fragment_name, .. } => {
                    fragment_models.contains(returned_model_id)
                        && returned_model_id == fragment_interface_model_id(fragment_name)
                }
                IrAccessor::Subtype { .. } => ids.contains(returned_model_id),
            };
            if !expected {
                errors.push(internal_error!(
                    "accessor of \"{}\" returns unknown model \"{returned_model_id}\"",
                    model.id
                ));
            }
        }
        for interface_id in &model.implements {
            if !resolves(interface_id) {
                errors.push(internal_error!(
                    "\"{}\" implements unknown model \"{interface_id}\"",
                    model.id
                ));
            }
        }
        for property in &model.properties {
            let Some(model_id) = property.info.ty.model_id() else {
                continue;
            };
            if !resolves(model_id) {
                errors.push(internal_error!(
                    "property \"{}\" of \"{}\" has unknown model \"{model_id}\"",
                    property.info.response_name,
                    model.id
                ));
            }
        }
    }
    errors.into_result()
}
