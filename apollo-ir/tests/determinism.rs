use apollo_ir::CodegenModels;
use apollo_ir::IrConfig;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::build_with;

const DOCUMENTS: &str = r#"
query Everything($first: Int, $a: Boolean!) {
  node {
    id
    ... on Named { name ... on Cat { meow friends(first: $first) { id ...Parts } } }
    ... on Dog @include(if: $a) { bark }
  }
  search { ...Parts ... on Bird { wingspan } }
}
fragment Parts on Named { name }
"#;

#[rstest]
#[case::operation_based(CodegenModels::OperationBased, false, false)]
#[case::response_based(CodegenModels::ResponseBased, false, false)]
#[case::flattened(CodegenModels::ResponseBased, true, false)]
#[case::data_builders(CodegenModels::OperationBased, false, true)]
fn building_twice_gives_identical_output(
    #[case] codegen_models: CodegenModels,
    #[case] flatten_models: bool,
    #[case] generate_data_builders: bool,
) {
    let config = IrConfig {
        codegen_models,
        flatten_models,
        generate_data_builders,
        ..IrConfig::default()
    };
    let first = build_with(DOCUMENTS, config.clone());
    let second = build_with(DOCUMENTS, config);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}
