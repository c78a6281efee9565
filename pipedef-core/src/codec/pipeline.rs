//! Pipeline definition expand/flatten

use serde_json::Value;

use super::{Decoder, join, non_empty};
use crate::Bag;
use crate::domain::pipeline::{
    Field, ParameterAttribute, ParameterObject, ParameterValue, PipelineObject,
};
use crate::dto::pipeline::{PipelineDefinitionOutput, PutPipelineDefinition};
use crate::schema::attr;

// =============================================================================
// Expand
// =============================================================================

/// Builds the submission request for `pipeline_id` from a configuration bag
///
/// Parameter collections that are absent from the bag stay unset on the request.
pub fn expand_put_definition(
    decoder: &mut Decoder,
    pipeline_id: &str,
    bag: &Bag,
) -> PutPipelineDefinition {
    PutPipelineDefinition {
        pipeline_id: pipeline_id.to_string(),
        pipeline_objects: expand_pipeline_objects(decoder, bag.get(attr::PIPELINE_OBJECT))
            .unwrap_or_default(),
        parameter_objects: expand_parameter_objects(decoder, bag.get(attr::PARAMETER_OBJECT)),
        parameter_values: expand_parameter_values(decoder, bag.get(attr::PARAMETER_VALUE)),
    }
}

pub fn expand_pipeline_objects(
    decoder: &mut Decoder,
    value: Option<&Value>,
) -> Option<Vec<PipelineObject>> {
    let elements = decoder.elements(attr::PIPELINE_OBJECT, value)?;
    non_empty(
        elements
            .into_iter()
            .filter_map(|(path, bag)| expand_pipeline_object(decoder, &path, Some(bag)))
            .collect(),
    )
}

pub fn expand_pipeline_object(
    decoder: &mut Decoder,
    path: &str,
    bag: Option<&Bag>,
) -> Option<PipelineObject> {
    let bag = bag?;
    let id = decoder.required_string(path, bag, attr::ID)?;
    let name = decoder.required_string(path, bag, attr::NAME)?;
    let fields = expand_fields(decoder, &join(path, attr::FIELD), bag.get(attr::FIELD));

    Some(PipelineObject {
        id,
        name,
        fields: fields.unwrap_or_default(),
    })
}

pub fn expand_fields(decoder: &mut Decoder, path: &str, value: Option<&Value>) -> Option<Vec<Field>> {
    let elements = decoder.elements(path, value)?;
    non_empty(
        elements
            .into_iter()
            .filter_map(|(path, bag)| expand_field(decoder, &path, Some(bag)))
            .collect(),
    )
}

/// Expands one field; empty `ref_value`/`string_value` decode as unset
pub fn expand_field(decoder: &mut Decoder, path: &str, bag: Option<&Bag>) -> Option<Field> {
    let bag = bag?;
    let key = decoder.required_string(path, bag, attr::KEY)?;

    Some(Field {
        key,
        ref_value: decoder.optional_string(path, bag, attr::REF_VALUE),
        string_value: decoder.optional_string(path, bag, attr::STRING_VALUE),
    })
}

pub fn expand_parameter_objects(
    decoder: &mut Decoder,
    value: Option<&Value>,
) -> Option<Vec<ParameterObject>> {
    let elements = decoder.elements(attr::PARAMETER_OBJECT, value)?;
    non_empty(
        elements
            .into_iter()
            .filter_map(|(path, bag)| expand_parameter_object(decoder, &path, Some(bag)))
            .collect(),
    )
}

pub fn expand_parameter_object(
    decoder: &mut Decoder,
    path: &str,
    bag: Option<&Bag>,
) -> Option<ParameterObject> {
    let bag = bag?;
    let id = decoder.required_string(path, bag, attr::ID)?;
    let attributes =
        expand_parameter_attributes(decoder, &join(path, attr::ATTRIBUTE), bag.get(attr::ATTRIBUTE));

    Some(ParameterObject {
        id,
        attributes: attributes.unwrap_or_default(),
    })
}

pub fn expand_parameter_attributes(
    decoder: &mut Decoder,
    path: &str,
    value: Option<&Value>,
) -> Option<Vec<ParameterAttribute>> {
    let elements = decoder.elements(path, value)?;
    non_empty(
        elements
            .into_iter()
            .filter_map(|(path, bag)| expand_parameter_attribute(decoder, &path, Some(bag)))
            .collect(),
    )
}

pub fn expand_parameter_attribute(
    decoder: &mut Decoder,
    path: &str,
    bag: Option<&Bag>,
) -> Option<ParameterAttribute> {
    let bag = bag?;

    Some(ParameterAttribute {
        key: decoder.required_string(path, bag, attr::KEY)?,
        string_value: decoder.required_string(path, bag, attr::STRING_VALUE)?,
    })
}

pub fn expand_parameter_values(
    decoder: &mut Decoder,
    value: Option<&Value>,
) -> Option<Vec<ParameterValue>> {
    let elements = decoder.elements(attr::PARAMETER_VALUE, value)?;
    non_empty(
        elements
            .into_iter()
            .filter_map(|(path, bag)| expand_parameter_value(decoder, &path, Some(bag)))
            .collect(),
    )
}

pub fn expand_parameter_value(
    decoder: &mut Decoder,
    path: &str,
    bag: Option<&Bag>,
) -> Option<ParameterValue> {
    let bag = bag?;

    Some(ParameterValue {
        id: decoder.required_string(path, bag, attr::ID)?,
        string_value: decoder.required_string(path, bag, attr::STRING_VALUE)?,
    })
}

// =============================================================================
// Flatten
// =============================================================================

/// Flattens a stored definition into `(attribute, value)` pairs
///
/// Each collection is flattened independently so the caller can apply them
/// one at a time.
pub fn flatten_definition(output: &PipelineDefinitionOutput) -> Vec<(&'static str, Value)> {
    vec![
        (
            attr::PARAMETER_OBJECT,
            flatten_parameter_objects(&output.parameter_objects),
        ),
        (
            attr::PARAMETER_VALUE,
            flatten_parameter_values(&output.parameter_values),
        ),
        (
            attr::PIPELINE_OBJECT,
            flatten_pipeline_objects(&output.pipeline_objects),
        ),
    ]
}

pub fn flatten_pipeline_objects(objects: &[PipelineObject]) -> Value {
    Value::Array(
        objects
            .iter()
            .map(|object| Value::Object(flatten_pipeline_object(object)))
            .collect(),
    )
}

pub fn flatten_pipeline_object(object: &PipelineObject) -> Bag {
    let mut bag = Bag::new();
    bag.insert(attr::FIELD.to_string(), flatten_fields(&object.fields));
    bag.insert(attr::ID.to_string(), Value::String(object.id.clone()));
    bag.insert(attr::NAME.to_string(), Value::String(object.name.clone()));
    bag
}

pub fn flatten_fields(fields: &[Field]) -> Value {
    Value::Array(
        fields
            .iter()
            .map(|field| Value::Object(flatten_field(field)))
            .collect(),
    )
}

/// Unset values flatten to `""`, never to a missing key
pub fn flatten_field(field: &Field) -> Bag {
    let mut bag = Bag::new();
    bag.insert(attr::KEY.to_string(), Value::String(field.key.clone()));
    bag.insert(
        attr::REF_VALUE.to_string(),
        Value::String(field.ref_value.clone().unwrap_or_default()),
    );
    bag.insert(
        attr::STRING_VALUE.to_string(),
        Value::String(field.string_value.clone().unwrap_or_default()),
    );
    bag
}

pub fn flatten_parameter_objects(objects: &[ParameterObject]) -> Value {
    Value::Array(
        objects
            .iter()
            .map(|object| Value::Object(flatten_parameter_object(object)))
            .collect(),
    )
}

pub fn flatten_parameter_object(object: &ParameterObject) -> Bag {
    let mut bag = Bag::new();
    bag.insert(
        attr::ATTRIBUTE.to_string(),
        flatten_parameter_attributes(&object.attributes),
    );
    bag.insert(attr::ID.to_string(), Value::String(object.id.clone()));
    bag
}

pub fn flatten_parameter_attributes(attributes: &[ParameterAttribute]) -> Value {
    Value::Array(
        attributes
            .iter()
            .map(|attribute| Value::Object(flatten_parameter_attribute(attribute)))
            .collect(),
    )
}

pub fn flatten_parameter_attribute(attribute: &ParameterAttribute) -> Bag {
    let mut bag = Bag::new();
    bag.insert(attr::KEY.to_string(), Value::String(attribute.key.clone()));
    bag.insert(
        attr::STRING_VALUE.to_string(),
        Value::String(attribute.string_value.clone()),
    );
    bag
}

pub fn flatten_parameter_values(values: &[ParameterValue]) -> Value {
    Value::Array(
        values
            .iter()
            .map(|value| Value::Object(flatten_parameter_value(value)))
            .collect(),
    )
}

pub fn flatten_parameter_value(value: &ParameterValue) -> Bag {
    let mut bag = Bag::new();
    bag.insert(attr::ID.to_string(), Value::String(value.id.clone()));
    bag.insert(
        attr::STRING_VALUE.to_string(),
        Value::String(value.string_value.clone()),
    );
    bag
}
