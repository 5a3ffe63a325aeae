//! The intermediate representation handed to code emission.
//!
//! Everything in here is plain data: built in one pass by
//! [`IrOperationsBuilder`](crate::builder::IrOperationsBuilder), immutable once returned, and
//! serializable for snapshotting. Every container keeps insertion order.
use apollo_compiler::Name;
use apollo_compiler::ast::OperationType;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use serde::Serialize;

use crate::config::CodegenModels;

mod model;
mod selection;
mod types;

pub use model::IrAccessor;
pub use model::IrFieldInfo;
pub use model::IrModel;
pub use model::IrModelGroup;
pub use model::IrProperty;
pub use model::TypeSet;
pub use selection::IrArgument;
pub use selection::IrField;
pub use selection::IrFragment;
pub use selection::IrFragmentKind;
pub use selection::IrSelection;
pub use selection::IrSelectionSet;
pub use selection::IrVariable;
pub use types::IrType;
pub use types::IrTypeRef;
pub use types::IrValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "camelCase")]
pub enum IrOperationKind {
    #[strum(to_string = "query")]
    Query,
    #[strum(to_string = "mutation")]
    Mutation,
    #[strum(to_string = "subscription")]
    Subscription,
}

impl From<OperationType> for IrOperationKind {
    fn from(operation_type: OperationType) -> Self {
        match operation_type {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

/// Everything code emission needs for one set of executable documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOperations {
    pub operations: Vec<IrOperation>,
    pub fragments: Vec<IrFragmentDefinition>,
    /// Schema types referenced by the documents, for schema pruning.
    pub used_types: IndexSet<Name>,
    /// Fields referenced by the documents, keyed by parent type.
    pub used_fields: IndexMap<Name, IndexSet<Name>>,
    pub flatten_models: bool,
    pub decapitalize_fields: bool,
    pub generate_data_builders: bool,
    pub codegen_models: CodegenModels,
}

impl IrOperations {
    pub fn operation(&self, name: &str) -> Option<&IrOperation> {
        self.operations
            .iter()
            .find(|operation| operation.name.as_str() == name)
    }

    pub fn fragment(&self, name: &str) -> Option<&IrFragmentDefinition> {
        self.fragments
            .iter()
            .find(|fragment| fragment.name.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOperation {
    pub name: Name,
    pub operation_kind: IrOperationKind,
    /// The root type of the operation.
    pub type_condition: Name,
    pub variables: Vec<IrVariable>,
    pub selection_sets: Vec<IrSelectionSet>,
    /// The operation text followed by every fragment it uses, as sent to the server.
    pub source_with_fragments: String,
    pub file_path: Option<String>,
    pub response_based_data_model_group: Option<IrModelGroup>,
    pub data_property: IrProperty,
    pub data_model_group: IrModelGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrFragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub is_type_condition_abstract: bool,
    /// Variables used anywhere in the fragment or the fragments it spreads, without defaults.
    pub variables: Vec<IrVariable>,
    pub selection_sets: Vec<IrSelectionSet>,
    pub source: String,
    pub file_path: Option<String>,
    pub interface_model_group: Option<IrModelGroup>,
    pub data_property: IrProperty,
    pub data_model_group: IrModelGroup,
}

impl IrOperation {
    /// Every model generated for the operation, including the response-based ones.
    pub fn all_models(&self) -> Vec<&IrModel> {
        let mut models = self.data_model_group.all_models();
        if let Some(group) = &self.response_based_data_model_group {
            models.extend(group.all_models());
        }
        models
    }
}

impl IrFragmentDefinition {
    /// Every model generated for the fragment, including its interfaces.
    pub fn all_models(&self) -> Vec<&IrModel> {
        let mut models = self.data_model_group.all_models();
        if let Some(group) = &self.interface_model_group {
            models.extend(group.all_models());
        }
        models
    }
}
