//! Pipeline definition domain types

use serde::{Deserialize, Serialize};

/// One node in a pipeline's definition graph
///
/// Fields may reference other objects by id through `ref_value`. Cycles are
/// not checked here; the management service validates the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineObject {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

/// A key/value pair on a pipeline object
///
/// At most one of `ref_value` and `string_value` is meaningful. An empty
/// string in configuration never reaches this record: it is decoded as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

/// A declared pipeline parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterObject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<ParameterAttribute>,
}

/// An attribute of a parameter object (type, description, default...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterAttribute {
    pub key: String,
    pub string_value: String,
}

/// A concrete value bound to a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    pub id: String,
    pub string_value: String,
}

/// Validation failure reported by the service for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub id: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Non-fatal validation notice reported by the service for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub id: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Field {
    /// Creates a field holding a literal string value
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ref_value: None,
            string_value: Some(value.into()),
        }
    }

    /// Creates a field referencing another pipeline object by id
    pub fn reference(key: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ref_value: Some(object_id.into()),
            string_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_serializes_without_absent_values() {
        let field = Field::string("type", "Default");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "key": "type", "stringValue": "Default" })
        );
    }

    #[test]
    fn test_object_without_fields_deserializes() {
        let object: PipelineObject =
            serde_json::from_value(serde_json::json!({ "id": "o1", "name": "Default" })).unwrap();
        assert!(object.fields.is_empty());
    }
}
