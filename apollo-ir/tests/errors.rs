use apollo_compiler::ExecutableDocument;
use apollo_compiler::validation::Valid;
use apollo_ir::IrOperationsBuilder;
use apollo_ir::SchemaIndex;
use pretty_assertions::assert_eq;

use crate::common::SCHEMA;

fn schema() -> SchemaIndex {
    SchemaIndex::parse(SCHEMA, "schema.graphql").unwrap()
}

/// Skips validation so that documents the builder must reject can reach it.
fn unvalidated(schema: &SchemaIndex, source: &str) -> Valid<ExecutableDocument> {
    let document = ExecutableDocument::parse(schema.schema(), source, "doc.graphql").unwrap();
    Valid::assume_valid(document)
}

#[test]
fn conflicting_fields_are_reported() {
    let schema = schema();
    let document = unvalidated(&schema, "query M { count(max: 1) count(max: 2) }");
    let error = IrOperationsBuilder::new(&schema, &document)
        .build()
        .unwrap_err();
    let codes: Vec<&str> = error.errors().iter().map(|error| error.code()).collect();
    assert_eq!(codes, ["FIELD_MERGE_CONFLICT"]);
    assert!(!error.is_internal());
}

#[test]
fn anonymous_operations_fail_alone() {
    let schema = schema();
    let document = unvalidated(
        &schema,
        "{ node { ...Ids } } fragment Ids on Node { id }",
    );
    let (ir, errors) = IrOperationsBuilder::new(&schema, &document).build_lenient();
    let codes: Vec<&str> = errors
        .iter()
        .flat_map(|error| error.errors())
        .map(|error| error.code())
        .collect();
    assert_eq!(codes, ["ANONYMOUS_OPERATION"]);
    assert!(ir.operations.is_empty());
    assert_eq!(ir.fragments.len(), 1);
    assert_eq!(ir.fragments[0].name.as_str(), "Ids");
}

#[test]
fn invalid_schemas_are_rejected() {
    assert!(SchemaIndex::parse("type Query { field: Missing }", "schema.graphql").is_err());
}

#[test]
fn spreads_of_undefined_fragments_are_reported() {
    let schema = schema();
    let document = unvalidated(&schema, "query Missing { node { id ...Nope } }");
    let error = IrOperationsBuilder::new(&schema, &document)
        .build()
        .unwrap_err();
    let codes: Vec<&str> = error.errors().iter().map(|error| error.code()).collect();
    assert_eq!(codes, ["INVALID_FRAGMENT_REFERENCE"]);
    assert_eq!(error.to_string(), r#"Unknown fragment "Nope""#);
}

#[test]
fn errors_of_every_root_are_reported_together() {
    let schema = schema();
    let document = unvalidated(
        &schema,
        r#"
        query Conflict { count(max: 1) count(max: 2) }
        query Missing { node { ...Nope } }
        query C { count }
        "#,
    );

    let error = IrOperationsBuilder::new(&schema, &document)
        .build()
        .unwrap_err();
    let codes: Vec<&str> = error.errors().iter().map(|error| error.code()).collect();
    assert_eq!(codes, ["FIELD_MERGE_CONFLICT", "INVALID_FRAGMENT_REFERENCE"]);
    assert!(!error.is_internal());

    let (ir, errors) = IrOperationsBuilder::new(&schema, &document).build_lenient();
    assert_eq!(errors.len(), 2);
    let names: Vec<&str> = ir
        .operations
        .iter()
        .map(|operation| operation.name.as_str())
        .collect();
    assert_eq!(names, ["C"]);
    let used_fields: Vec<&str> = ir.used_fields["Query"]
        .iter()
        .map(|field| field.as_str())
        .collect();
    // the failed roots leave no trace in usage
    assert_eq!(used_fields, ["count"]);
}
