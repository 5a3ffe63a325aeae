use apollo_compiler::Name;
use serde::Serialize;

use super::IrType;
use super::IrTypeRef;
use super::IrValue;
use crate::conditions::BVariable;
use crate::conditions::BooleanExpression;

/// A selection set of an operation or fragment, after merging same-named fields.
///
/// Child selection sets are referenced by name. Names are unique within one operation or
/// fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrSelectionSet {
    pub name: String,
    pub is_root: bool,
    pub selections: Vec<IrSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IrSelection {
    Field(IrField),
    Fragment(IrFragment),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrField {
    pub name: Name,
    pub alias: Option<Name>,
    #[serde(rename = "type")]
    pub ty: IrTypeRef,
    pub condition: BooleanExpression<BVariable>,
    pub arguments: Vec<IrArgument>,
    pub selection_set_name: Option<String>,
}

impl IrField {
    /// The alias if there is one, otherwise the field name.
    pub fn response_name(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrFragment {
    pub type_condition: Name,
    /// The object types the fragment applies to at this position, in schema order.
    pub possible_types: Vec<Name>,
    pub condition: BooleanExpression<BVariable>,
    pub kind: IrFragmentKind,
}

/// A fragment is either a named spread, whose selections live in the fragment definition, or an
/// inline fragment with its own selection set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IrFragmentKind {
    #[serde(rename_all = "camelCase")]
    Spread { name: Name },
    #[serde(rename_all = "camelCase")]
    Inline { selection_set_name: String },
}

impl IrFragment {
    pub fn name(&self) -> Option<&Name> {
        match &self.kind {
            IrFragmentKind::Spread { name } => Some(name),
            IrFragmentKind::Inline { .. } => None,
        }
    }

    pub fn selection_set_name(&self) -> Option<&str> {
        match &self.kind {
            IrFragmentKind::Spread { .. } => None,
            IrFragmentKind::Inline { selection_set_name } => Some(selection_set_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrArgument {
    pub name: Name,
    pub value: IrValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrVariable {
    pub name: Name,
    pub default_value: Option<IrValue>,
    #[serde(rename = "type")]
    pub ty: IrType,
}
