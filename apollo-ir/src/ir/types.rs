use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use serde::Serialize;

/// A schema type reference, as written in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "ofType", rename_all = "camelCase")]
pub enum IrTypeRef {
    NonNull(Box<IrTypeRef>),
    List(Box<IrTypeRef>),
    Named(Name),
}

impl IrTypeRef {
    /// The named type at the bottom of the wrappers.
    pub fn leaf_name(&self) -> &Name {
        match self {
            Self::NonNull(inner) | Self::List(inner) => inner.leaf_name(),
            Self::Named(name) => name,
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl fmt::Display for IrTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// The type of a model property or variable, with composite types replaced by generated models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "ofType", rename_all = "camelCase")]
pub enum IrType {
    NonNull(Box<IrType>),
    List(Box<IrType>),
    Scalar(Name),
    Enum(Name),
    InputObject(Name),
    /// The id of a generated model.
    Model(String),
}

impl IrType {
    pub fn nullable(self) -> Self {
        match self {
            Self::NonNull(inner) => *inner,
            other => other,
        }
    }

    /// The model id at the bottom of the wrappers, if any.
    pub fn model_id(&self) -> Option<&str> {
        match self {
            Self::NonNull(inner) | Self::List(inner) => inner.model_id(),
            Self::Model(id) => Some(id),
            Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_) => None,
        }
    }

    /// The schema type at the bottom of the wrappers, unless it is a model.
    pub fn named_type(&self) -> Option<&Name> {
        match self {
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
            Self::Scalar(name) | Self::Enum(name) | Self::InputObject(name) => Some(name),
            Self::Model(_) => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::Scalar(name) | Self::Enum(name) | Self::InputObject(name) => {
                write!(f, "{name}")
            }
            Self::Model(id) => write!(f, "<{id}>"),
        }
    }
}

/// A GraphQL input value.
///
/// Object fields keep the order they were written in, but compare equal regardless of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum IrValue {
    Null,
    Int(String),
    Float(String),
    String(String),
    Boolean(bool),
    Enum(Name),
    Variable(Name),
    List(Vec<IrValue>),
    Object(IndexMap<Name, IrValue>),
}

impl From<&ast::Value> for IrValue {
    fn from(value: &ast::Value) -> Self {
        match value {
            ast::Value::Null => Self::Null,
            ast::Value::Int(int) => Self::Int(int.as_str().to_owned()),
            ast::Value::Float(float) => Self::Float(float.as_str().to_owned()),
            ast::Value::String(string) => Self::String(string.clone()),
            ast::Value::Boolean(boolean) => Self::Boolean(*boolean),
            ast::Value::Enum(name) => Self::Enum(name.clone()),
            ast::Value::Variable(name) => Self::Variable(name.clone()),
            ast::Value::List(items) => {
                Self::List(items.iter().map(|item| Self::from(item.as_ref())).collect())
            }
            ast::Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::from(value.as_ref())))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for IrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(value) | Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Enum(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::List(items) => fmt::Display::fmt(&crate::display_helpers::DisplaySlice(items), f),
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
