use apollo_ir::IrConfig;
use apollo_ir::ir::IrModel;
use pretty_assertions::assert_eq;

use crate::common::build;
use crate::common::build_with;
use crate::common::model;

fn describe_properties(model: &IrModel) -> Vec<String> {
    model
        .properties
        .iter()
        .map(|property| {
            let mut line = format!("{}: {}", property.info.response_name, property.info.ty);
            if !property.condition.is_true() {
                line.push_str(&format!(" if {}", property.condition));
            }
            line
        })
        .collect()
}

#[test]
fn fragments_become_synthetic_properties() {
    let ir = build(
        r#"
        query O($withName: Boolean!) {
          node { id ... on Cat { meow } ...NameParts @include(if: $withName) }
        }
        fragment NameParts on Named { name }
        "#,
    );
    let data = &ir.operation("O").unwrap().data_model_group;
    assert!(data.all_models().iter().all(|model| !model.is_interface));

    let node = model(data, "operation.O.data.node");
    assert_eq!(
        describe_properties(node),
        [
            "id: ID!",
            "onCat: <operation.O.data.node.onCat> if __typename in [Cat]",
            "NameParts: <fragment.NameParts.data> if $withName && __typename in [Cat, Dog]",
        ]
    );
    let buffering: Vec<bool> = node
        .properties
        .iter()
        .map(|property| property.requires_buffering)
        .collect();
    assert_eq!(buffering, [false, true, true]);
    assert!(node.properties[1].requires_typename());
    assert!(node.properties[1].is_synthetic());

    let on_cat = model(data, "operation.O.data.node.onCat");
    assert_eq!(on_cat.possible_types.len(), 1);
    assert_eq!(on_cat.possible_types[0].as_str(), "Cat");
    assert_eq!(describe_properties(on_cat), ["meow: String"]);

    let fragment = ir.fragment("NameParts").unwrap();
    assert!(fragment.interface_model_group.is_none());
    assert_eq!(fragment.data_model_group.models.len(), 1);
}

#[test]
fn fragments_on_the_parent_type_need_no_type_check() {
    let ir = build(
        r#"
        query P { node { ... on Node { id } ...Ids } }
        fragment Ids on Node { id }
        "#,
    );
    let data = &ir.operation("P").unwrap().data_model_group;
    assert_eq!(
        describe_properties(model(data, "operation.P.data.node")),
        [
            "onNode: <operation.P.data.node.onNode>!",
            "Ids: <fragment.Ids.data>!",
        ]
    );
}

#[test]
fn inline_fragments_with_the_same_type_condition_share_a_model() {
    let ir = build(
        r#"
        query S($a: Boolean!) {
          node { ... on Cat { meow } ... on Cat @include(if: $a) { name } }
        }
        "#,
    );
    let data = &ir.operation("S").unwrap().data_model_group;
    let node = model(data, "operation.S.data.node");
    // the type check applies whatever `$a` is
    assert_eq!(
        describe_properties(node),
        ["onCat: <operation.S.data.node.onCat> if __typename in [Cat]"]
    );
    assert_eq!(
        describe_properties(model(data, "operation.S.data.node.onCat")),
        ["meow: String", "name: String"]
    );
}

#[test]
fn flattened_models_are_hoisted_in_pre_order() {
    let ir = build_with(
        r#"
        query Flat {
          node { id ... on Cat { friends { id } } }
          nodes { id }
        }
        "#,
        IrConfig {
            flatten_models: true,
            ..IrConfig::default()
        },
    );
    let data = &ir.operation("Flat").unwrap().data_model_group;
    let hoisted: Vec<&str> = data.models[0]
        .model_groups
        .iter()
        .map(|group| group.base_model_id.as_str())
        .collect();
    assert_eq!(
        hoisted,
        [
            "operation.Flat.data.node",
            "operation.Flat.data.onCat",
            "operation.Flat.data.friends",
            "operation.Flat.data.nodes",
        ]
    );
    assert!(
        data.models[0]
            .model_groups
            .iter()
            .all(|group| group.models.iter().all(|model| model.model_groups.is_empty()))
    );
    assert_eq!(
        describe_properties(model(data, "operation.Flat.data.onCat")),
        ["friends: [<operation.Flat.data.friends>]"]
    );
    assert_eq!(
        describe_properties(model(data, "operation.Flat.data")),
        [
            "node: <operation.Flat.data.node>",
            "nodes: [<operation.Flat.data.nodes>!]!",
        ]
    );
}

#[test]
fn flattened_ids_stay_unique() {
    let ir = build_with(
        "query Twice { node { ... on Cat { friends { id } } } pet { ... on Cat { friends { id } } } }",
        IrConfig {
            flatten_models: true,
            ..IrConfig::default()
        },
    );
    let data = &ir.operation("Twice").unwrap().data_model_group;
    let mut ids: Vec<&str> = data.all_models().iter().map(|model| model.id.as_str()).collect();
    let count = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), count);
    assert!(ids.contains(&"operation.Twice.data.friends1"));
    assert!(ids.contains(&"operation.Twice.data.onCat1"));
}
