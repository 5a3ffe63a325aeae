use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use apollo_compiler::Name;

/// Create an internal consistency error.
///
/// # Example
/// ```rust
/// use apollo_ir::internal_error;
/// use apollo_ir::error::IrError;
/// # fn may_be_none() -> Option<()> { None }
///
/// const NAME: &str = "the thing";
/// let result: Result<(), IrError> = may_be_none()
///     .ok_or_else(|| internal_error!("Expected {NAME} to be Some"));
/// ```
#[macro_export]
macro_rules! internal_error {
    ( $( $arg:tt )+ ) => {
        $crate::error::IrError::internal(format!( $( $arg )+ ))
    }
}

/// Break out of the current function, returning an internal consistency error.
///
/// # Example
/// ```rust
/// use apollo_ir::bail;
/// use apollo_ir::error::IrError;
/// # fn may_be_none() -> Option<()> { None }
///
/// fn example() -> Result<(), IrError> {
///     bail!("Something went horribly wrong");
///     unreachable!()
/// }
/// #
/// # _ = example();
/// ```
#[macro_export]
macro_rules! bail {
    ( $( $arg:tt )+ ) => {
        return Err($crate::internal_error!( $( $arg )+ ).into())
    }
}

/// A failure to build the IR for one operation or fragment.
///
/// Every variant is fatal to the operation or fragment being built. Apart from
/// [`SingleIrError::InternalConsistency`], they are caused by the input documents or schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SingleIrError {
    #[error(
        "An internal error has occurred, please report this bug to Apollo.\n\nDetails: {message}"
    )]
    InternalConsistency { message: String },
    #[error("Unknown type \"{type_name}\"")]
    UnknownType { type_name: String },
    #[error("Invalid type reference \"{reference}\": {message}")]
    InvalidTypeReference { reference: String, message: String },
    #[error("Cannot merge selections of \"{response_name}\": {message}")]
    FieldMergeConflict {
        response_name: Name,
        message: String,
    },
    #[error("Unknown fragment \"{fragment_name}\"")]
    InvalidFragmentReference { fragment_name: Name },
    #[error("Anonymous operations are not supported, every operation must have a name")]
    AnonymousOperation,
}

impl SingleIrError {
    /// A stable, machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// Errors collected over several operations and fragments, in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleIrErrors {
    pub errors: Vec<SingleIrError>,
}

impl MultipleIrErrors {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    pub fn push(&mut self, error: IrError) {
        match error {
            IrError::Single(error) => self.errors.push(error),
            IrError::Multiple(errors) => self.errors.extend(errors.errors),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `Ok(())` if no error was collected.
    pub fn into_result(self) -> Result<(), IrError> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.into_iter().next().map_or_else(
                || IrError::internal("error list unexpectedly empty"),
                IrError::from,
            )),
            _ => Err(self.into()),
        }
    }
}

impl Default for MultipleIrErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MultipleIrErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "The following errors occurred:")?;
        for error in &self.errors {
            let error = error.to_string();
            write!(f, "\n  - ")?;
            for c in error.chars() {
                if c == '\n' {
                    write!(f, "\n    ")?;
                } else {
                    f.write_char(c)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for MultipleIrErrors {}

impl FromIterator<SingleIrError> for MultipleIrErrors {
    fn from_iter<T: IntoIterator<Item = SingleIrError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error(transparent)]
    Single(#[from] SingleIrError),
    #[error(transparent)]
    Multiple(#[from] MultipleIrErrors),
}

impl std::fmt::Debug for IrError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(e) => std::fmt::Debug::fmt(e, f),
            Self::Multiple(e) => std::fmt::Debug::fmt(e, f),
        }
    }
}

impl IrError {
    pub fn internal(message: impl Into<String>) -> Self {
        SingleIrError::InternalConsistency {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn unknown_type(type_name: impl Display) -> Self {
        SingleIrError::UnknownType {
            type_name: type_name.to_string(),
        }
        .into()
    }

    pub(crate) fn merge_conflict(response_name: &Name, message: impl Into<String>) -> Self {
        SingleIrError::FieldMergeConflict {
            response_name: response_name.clone(),
            message: message.into(),
        }
        .into()
    }

    /// The individual errors, flattened.
    pub fn errors(&self) -> Vec<&SingleIrError> {
        match self {
            Self::Single(error) => vec![error],
            Self::Multiple(errors) => errors.errors.iter().collect(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.errors()
            .iter()
            .any(|error| matches!(error, SingleIrError::InternalConsistency { .. }))
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn single_error_codes_are_stable() {
        let error = SingleIrError::InvalidFragmentReference {
            fragment_name: name!("HeroDetails"),
        };
        assert_eq!(error.code(), "INVALID_FRAGMENT_REFERENCE");
        assert_eq!(error.to_string(), r#"Unknown fragment "HeroDetails""#);
    }

    #[test]
    fn collects_errors_in_order() {
        let mut errors = MultipleIrErrors::new();
        assert!(errors.is_empty());
        errors.push(IrError::unknown_type("Droid"));
        errors.push(
            MultipleIrErrors::from_iter([SingleIrError::AnonymousOperation, SingleIrError::UnknownType {
                type_name: "Human".to_owned(),
            }])
            .into(),
        );
        let error = errors.into_result().unwrap_err();
        assert_eq!(error.errors().len(), 3);
        insta::assert_snapshot!(error, @r###"
        The following errors occurred:
          - Unknown type "Droid"
          - Anonymous operations are not supported, every operation must have a name
          - Unknown type "Human"
        "###);
    }

    #[test]
    fn single_collected_error_is_not_wrapped() {
        let mut errors = MultipleIrErrors::new();
        errors.push(IrError::internal("oops"));
        let error = errors.into_result().unwrap_err();
        assert!(matches!(error, IrError::Single(_)));
        assert!(error.is_internal());
    }

    #[test]
    fn collected_errors_are_std_errors() {
        let error: IrError = MultipleIrErrors::from_iter([
            SingleIrError::AnonymousOperation,
            SingleIrError::UnknownType {
                type_name: "Droid".to_owned(),
            },
        ])
        .into();
        let error: Box<dyn std::error::Error> = Box::new(error);
        assert!(error.to_string().starts_with("The following errors occurred:"));
        assert!(error.source().is_none());
    }
}
