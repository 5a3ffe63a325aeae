use apollo_ir::CodegenModels;
use apollo_ir::IrConfig;
use apollo_ir::IrOperations;
use apollo_ir::IrOperationsBuilder;
use apollo_ir::SchemaIndex;
use apollo_ir::ir::IrModel;
use apollo_ir::ir::IrModelGroup;

pub(crate) const SCHEMA: &str = r#"
type Query {
  node: Node
  nodes: [Node!]!
  ghost: Ghost
  pet: Pet
  count(max: Int): Int
  search(filter: Filter): [SearchResult]
}

interface Node { id: ID! }
interface Named { name: String }
interface Ghost { id: ID! }

type Cat implements Node & Named {
  id: ID!
  name: String
  meow: String
  friends(first: Int = 10): [Node]
}
type Dog implements Node & Named { id: ID!, name: String, bark: String }
type Bird implements Node {
  id: ID!
  "Tip to tip."
  wingspan: Float @deprecated
}

union Pet = Cat | Dog
union SearchResult = Cat | Dog | Bird

input Filter { text: String, species: Species }
enum Species { CAT, DOG }
"#;

pub(crate) fn response_based() -> IrConfig {
    IrConfig {
        codegen_models: CodegenModels::ResponseBased,
        ..IrConfig::default()
    }
}

pub(crate) fn build_with(documents: &str, config: IrConfig) -> IrOperations {
    let (schema, document) =
        apollo_compiler::parser::Parser::new()
            .parse_mixed_validate(format!("{SCHEMA}\n{documents}"), "pets.graphql")
            .unwrap();
    let schema = SchemaIndex::new(schema);
    IrOperationsBuilder::new(&schema, &document)
        .with_config(config)
        .build()
        .unwrap()
}

pub(crate) fn build(documents: &str) -> IrOperations {
    build_with(documents, IrConfig::default())
}

/// Every group of a tree, in pre-order.
pub(crate) fn all_groups(group: &IrModelGroup) -> Vec<&IrModelGroup> {
    let mut groups = vec![group];
    for model in &group.models {
        for nested in &model.model_groups {
            groups.extend(all_groups(nested));
        }
    }
    groups
}

pub(crate) fn group<'a>(root: &'a IrModelGroup, id: &str) -> &'a IrModelGroup {
    all_groups(root)
        .into_iter()
        .find(|group| group.base_model_id == id)
        .unwrap_or_else(|| panic!("no group {id}"))
}

pub(crate) fn model<'a>(root: &'a IrModelGroup, id: &str) -> &'a IrModel {
    root.all_models()
        .into_iter()
        .find(|model| model.id == id)
        .unwrap_or_else(|| panic!("no model {id}"))
}

pub(crate) fn property_names(model: &IrModel) -> Vec<String> {
    model
        .properties
        .iter()
        .map(|property| {
            let mut name = property.info.response_name.to_string();
            if property.is_override {
                name.push_str(" (override)");
            }
            name
        })
        .collect()
}
