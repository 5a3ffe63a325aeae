use serde::Deserialize;
use serde::Serialize;

/// Which model shapes are generated for operations and fragments.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum CodegenModels {
    /// One model per selection set, mirroring the documents. Inline fragments and fragment
    /// spreads become synthetic properties.
    #[default]
    OperationBased,
    /// Models follow the possible shapes of the response: polymorphic positions are split into
    /// an interface and one concrete model per shape.
    ResponseBased,
}

impl CodegenModels {
    /// Response-based fragments get an interface model group that the models spreading them
    /// implement.
    pub fn generates_fragment_interfaces(self) -> bool {
        matches!(self, Self::ResponseBased)
    }
}

/// Compiler-wide options, threaded explicitly through the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IrConfig {
    pub codegen_models: CodegenModels,
    /// Hoist nested model groups into the root model instead of nesting them under the model
    /// that declares the field.
    pub flatten_models: bool,
    /// Carried through for code emission. Field names are never changed here.
    pub decapitalize_fields: bool,
    /// Also build response-based models for operations so that data builders can be generated,
    /// whatever `codegen_models` is.
    pub generate_data_builders: bool,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn defaults_to_operation_based() {
        let config: IrConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, IrConfig::default());
        assert_eq!(config.codegen_models, CodegenModels::OperationBased);
        assert!(!config.flatten_models);
    }

    #[test]
    fn reads_camel_case_keys() {
        let config: IrConfig = serde_json::from_str(
            r#"{ "codegenModels": "responseBased", "flattenModels": true, "generateDataBuilders": true }"#,
        )
        .unwrap();
        assert_eq!(config.codegen_models, CodegenModels::ResponseBased);
        assert!(config.flatten_models);
        assert!(config.generate_data_builders);
        assert!(!config.decapitalize_fields);
    }

    #[test]
    fn codegen_models_names() {
        assert_eq!(CodegenModels::ResponseBased.to_string(), "responseBased");
        assert_eq!(
            CodegenModels::from_str("operationBased").unwrap(),
            CodegenModels::OperationBased
        );
        assert!(CodegenModels::from_str("experimental_operationBasedWithInterfaces").is_err());
    }
}
