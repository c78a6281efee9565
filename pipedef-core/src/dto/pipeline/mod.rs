//! Pipeline definition DTOs

use serde::{Deserialize, Serialize};

use crate::domain::pipeline::{
    ParameterObject, ParameterValue, PipelineObject, ValidationError, ValidationWarning,
};

/// Request to submit (create or fully replace) a pipeline definition
///
/// Parameter collections that were not configured stay `None` and are left
/// off the wire entirely rather than sent as empty lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutPipelineDefinition {
    pub pipeline_id: String,
    pub pipeline_objects: Vec<PipelineObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_objects: Option<Vec<ParameterObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_values: Option<Vec<ParameterValue>>,
}

/// Response to a definition submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutPipelineDefinitionOutput {
    /// Set when the service rejected the definition
    #[serde(default)]
    pub errored: bool,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
    #[serde(default)]
    pub validation_warnings: Vec<ValidationWarning>,
}

/// The definition as currently stored by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinitionOutput {
    #[serde(default)]
    pub pipeline_objects: Vec<PipelineObject>,
    #[serde(default)]
    pub parameter_objects: Vec<ParameterObject>,
    #[serde(default)]
    pub parameter_values: Vec<ParameterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_parameters_are_omitted() {
        let req = PutPipelineDefinition {
            pipeline_id: "p1".to_string(),
            pipeline_objects: vec![],
            parameter_objects: None,
            parameter_values: None,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "pipelineId": "p1", "pipelineObjects": [] })
        );
    }

    #[test]
    fn test_output_defaults_missing_collections() {
        let output: PutPipelineDefinitionOutput =
            serde_json::from_value(serde_json::json!({ "errored": false })).unwrap();
        assert!(!output.errored);
        assert!(output.validation_errors.is_empty());
        assert!(output.validation_warnings.is_empty());
    }
}
