//! Accessors let generated code narrow a polymorphic model to a more specific one of its group,
//! or read it through the interface of a fragment it spreads.
use super::collect::CollectedSpread;
use super::fragment_interface_model_id;
use crate::error::IrError;
use crate::internal_error;
use crate::ir::IrAccessor;
use crate::ir::IrModel;
use crate::ir::TypeSet;

/// Fills in the accessors of every model of one group.
///
/// Interface models get a subtype accessor for every type set of the group that strictly contains
/// their own, addressing the first model of the group with that type set, which is the interface
/// when a type set has both an interface and a concrete counterpart.
///
/// Fragment accessors address the interface model generated for the spread fragment. Interface
/// models get one for every fragment applying to some of their objects, concrete models one for
/// every fragment applying to all of their objects. `spreads` is empty when fragments have no
/// interface models.
pub(crate) fn synthesize_accessors(
    models: &mut [IrModel],
    spreads: &[&CollectedSpread],
) -> Result<(), IrError> {
    let targets: Vec<(TypeSet, String)> = models
        .iter()
        .map(|model| (model.type_set.clone(), model.id.clone()))
        .collect();

    for model in models.iter_mut() {
        let mut accessors = vec![];
        if model.is_interface {
            let mut seen = vec![];
            for (type_set, _) in &targets {
                if model.type_set.is_strict_subset(type_set) && !seen.contains(&type_set) {
                    seen.push(type_set);
                    let returned_model_id = targets
                        .iter()
                        .find(|(candidate, _)| candidate == type_set)
                        .map(|(_, id)| id.clone())
                        .ok_or_else(|| internal_error!("no model for type set {type_set}"))?;
                    accessors.push(IrAccessor::Subtype {
                        type_set: type_set.clone(),
                        returned_model_id,
                    });
                }
            }
        }

        for spread in spreads {
            let applies = if model.is_interface {
                model.type_set.is_subset(&spread.type_set)
            } else {
                spread.type_set.is_subset(&model.type_set)
            };
            if applies {
                accessors.push(IrAccessor::Fragment {
                    fragment_name: spread.fragment_name.clone(),
                    returned_model_id: fragment_interface_model_id(&spread.fragment_name),
                });
            }
        }
        model.accessors = accessors;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Name;
    use apollo_compiler::name;
    use pretty_assertions::assert_eq;

    use super::*;

    fn type_set(types: &[&str]) -> TypeSet {
        types.iter().map(|ty| Name::new(ty).unwrap()).collect()
    }

    fn model(id: &str, types: &[&str], is_interface: bool) -> IrModel {
        IrModel {
            name: id.to_owned(),
            id: id.to_owned(),
            type_set: type_set(types),
            properties: vec![],
            possible_types: vec![],
            accessors: vec![],
            implements: vec![],
            model_groups: vec![],
            is_interface,
            is_fallback: false,
        }
    }

    fn describe(model: &IrModel) -> Vec<String> {
        model
            .accessors
            .iter()
            .map(|accessor| match accessor {
                IrAccessor::Fragment {
                    fragment_name,
                    returned_model_id,
                } => format!("...{fragment_name} -> {returned_model_id}"),
                IrAccessor::Subtype {
                    type_set,
                    returned_model_id,
                } => format!("{type_set} -> {returned_model_id}"),
            })
            .collect()
    }

    #[test]
    fn interfaces_reach_every_refinement() {
        let mut models = vec![
            model("q", &["Node"], true),
            model("q#Named&Node", &["Named", "Node"], true),
            model("q#Cat&Named&Node", &["Cat", "Named", "Node"], false),
            model("q#Named&Node#other", &["Named", "Node"], false),
            model("q#other", &["Node"], false),
        ];
        let named_details = CollectedSpread {
            fragment_name: name!("NamedDetails"),
            type_set: type_set(&["Named", "Node"]),
        };
        synthesize_accessors(&mut models, &[&named_details]).unwrap();
        assert_eq!(
            describe(&models[0]),
            [
                "Named&Node -> q#Named&Node",
                "Cat&Named&Node -> q#Cat&Named&Node",
                "...NamedDetails -> fragment.NamedDetails.interface",
            ]
        );
        assert_eq!(
            describe(&models[1]),
            [
                "Cat&Named&Node -> q#Cat&Named&Node",
                "...NamedDetails -> fragment.NamedDetails.interface",
            ]
        );
        assert_eq!(
            describe(&models[2]),
            ["...NamedDetails -> fragment.NamedDetails.interface"]
        );
        assert_eq!(
            describe(&models[3]),
            ["...NamedDetails -> fragment.NamedDetails.interface"]
        );
        assert!(models[4].accessors.is_empty());
    }
}
