//! Models: the shapes code emission turns into data structures.
//!
//! Models reference each other by id, never by ownership: the implemented interfaces and accessor
//! targets of a model are ids of models that live elsewhere in the same operation or fragment (or,
//! for fragment interfaces, in the fragment's own tree).
use std::fmt;

use apollo_compiler::Name;
use itertools::Itertools;
use serde::Serialize;

use super::IrType;
use super::IrTypeRef;
use crate::conditions::BTerm;
use crate::conditions::BooleanExpression;
use crate::display_helpers::DisplaySlice;
use crate::display_helpers::State;
use crate::display_helpers::write_indented_lines;

/// A set of type condition names, kept sorted by name.
///
/// The type set of a selection is the position's own type plus every type condition it is nested
/// under that narrows the possible types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeSet(Vec<Name>);

impl TypeSet {
    pub fn new(ty: Name) -> Self {
        Self(vec![ty])
    }

    pub fn types(&self) -> &[Name] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ty: &str) -> bool {
        self.position(ty).is_ok()
    }

    fn position(&self, ty: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|existing| existing.as_str().cmp(ty))
    }

    /// A copy of this set that also contains `ty`.
    pub fn with(&self, ty: &Name) -> Self {
        let mut types = self.0.clone();
        if let Err(index) = self.position(ty) {
            types.insert(index, ty.clone());
        }
        Self(types)
    }

    pub fn union(&self, other: &Self) -> Self {
        other.0.iter().fold(self.clone(), |set, ty| set.with(ty))
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.iter().all(|ty| other.contains(ty))
    }

    pub fn is_strict_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }
}

impl FromIterator<Name> for TypeSet {
    fn from_iter<T: IntoIterator<Item = Name>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::default(), |set, ty| set.with(&ty))
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("&"))
    }
}

/// The merged description of one response key.
///
/// When several field selections are merged, the description, deprecation reason and opt-in
/// feature come from the first selection in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrFieldInfo {
    pub response_name: Name,
    #[serde(rename = "type")]
    pub ty: IrType,
    /// The schema type of the field. `None` for properties that do not come from a field.
    pub gql_type: Option<IrTypeRef>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub opt_in_feature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrProperty {
    pub info: IrFieldInfo,
    /// Whether an implemented model declares a property with the same response name.
    pub is_override: bool,
    pub condition: BooleanExpression<BTerm>,
    pub requires_buffering: bool,
}

impl IrProperty {
    pub fn is_synthetic(&self) -> bool {
        self.info.gql_type.is_none()
    }

    pub fn requires_typename(&self) -> bool {
        self.condition.contains_possible_types()
    }
}

/// A typed narrowing from a polymorphic model to a more specific one of its group, or to the
/// interface of a fragment it spreads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IrAccessor {
    /// Reads the model through the interface model of a fragment it spreads.
    #[serde(rename_all = "camelCase")]
    Fragment {
        fragment_name: Name,
        returned_model_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Subtype {
        type_set: TypeSet,
        returned_model_id: String,
    },
}

impl IrAccessor {
    pub fn returned_model_id(&self) -> &str {
        match self {
            Self::Fragment {
                returned_model_id, ..
            }
            | Self::Subtype {
                returned_model_id, ..
            } => returned_model_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrModel {
    pub name: String,
    pub id: String,
    pub type_set: TypeSet,
    pub properties: Vec<IrProperty>,
    /// The object types this model can represent, in schema order.
    pub possible_types: Vec<Name>,
    pub accessors: Vec<IrAccessor>,
    /// Ids of the interface models this model implements.
    pub implements: Vec<String>,
    pub model_groups: Vec<IrModelGroup>,
    pub is_interface: bool,
    pub is_fallback: bool,
}

impl IrModel {
    pub fn property(&self, response_name: &str) -> Option<&IrProperty> {
        self.properties
            .iter()
            .find(|property| property.info.response_name.as_str() == response_name)
    }
}

/// A base model and its polymorphic alternatives. The base model is always `models[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrModelGroup {
    pub base_model_id: String,
    pub models: Vec<IrModel>,
}

impl IrModelGroup {
    pub fn base_model(&self) -> Option<&IrModel> {
        self.models.first()
    }

    pub fn model(&self, id: &str) -> Option<&IrModel> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Every model of the group and of its nested groups, in pre-order.
    pub fn all_models(&self) -> Vec<&IrModel> {
        let mut models = vec![];
        self.collect_models(&mut models);
        models
    }

    fn collect_models<'a>(&'a self, out: &mut Vec<&'a IrModel>) {
        for model in &self.models {
            out.push(model);
            for group in &model.model_groups {
                group.collect_models(out);
            }
        }
    }

    fn write_indented(&self, state: &mut State<'_, '_>) -> fmt::Result {
        state.write_fmt(format_args!("group {}", self.base_model_id))?;
        write_indented_lines(state, &self.models, |state, model| {
            model.write_indented(state)
        })
    }
}

impl IrModel {
    fn write_indented(&self, state: &mut State<'_, '_>) -> fmt::Result {
        let kind = if self.is_fallback {
            "fallback"
        } else if self.is_interface {
            "interface"
        } else {
            "model"
        };
        state.write_fmt(format_args!(
            "{kind} {} {} on {}",
            self.name,
            self.id,
            DisplaySlice(&self.possible_types)
        ))?;
        if !self.implements.is_empty() {
            state.write_fmt(format_args!(
                " implements {}",
                DisplaySlice(&self.implements)
            ))?;
        }
        write_indented_lines(state, &self.properties, |state, property| {
            state.write_fmt(format_args!(
                "{}: {}",
                property.info.response_name, property.info.ty
            ))?;
            if !property.condition.is_true() {
                state.write_fmt(format_args!(" if {}", property.condition))?;
            }
            if property.is_override {
                state.write(" (override)")?;
            }
            Ok(())
        })?;
        write_indented_lines(state, &self.accessors, |state, accessor| match accessor {
            IrAccessor::Fragment {
                fragment_name,
                returned_model_id,
            } => state.write_fmt(format_args!("as ...{fragment_name} -> {returned_model_id}")),
            IrAccessor::Subtype {
                type_set,
                returned_model_id,
            } => state.write_fmt(format_args!("as {type_set} -> {returned_model_id}")),
        })?;
        write_indented_lines(state, &self.model_groups, |state, group| {
            group.write_indented(state)
        })
    }
}

impl fmt::Display for IrModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(&mut State::new(f))
    }
}
