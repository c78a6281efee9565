//! Resource schemas
//!
//! Declares, as data, the attribute-bag surface each resource exposes: which
//! attributes exist, their shape, whether they are required, and the length
//! constraints the management API enforces. The same declaration drives
//! plan-time validation, shape checks when the host stores flattened state, and
//! the normalization the host applies when it reads state back.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::Bag;

/// Attribute names shared by the schemas and the codec
pub mod attr {
    pub const PIPELINE_ID: &str = "pipeline_id";
    pub const PIPELINE_OBJECT: &str = "pipeline_object";
    pub const PARAMETER_OBJECT: &str = "parameter_object";
    pub const PARAMETER_VALUE: &str = "parameter_value";
    pub const FIELD: &str = "field";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const KEY: &str = "key";
    pub const REF_VALUE: &str = "ref_value";
    pub const STRING_VALUE: &str = "string_value";
    pub const CONTENT: &str = "content";
    pub const TAGS: &str = "tags";
    pub const ARN: &str = "arn";
}

/// Shape of an attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// A string whose length (in characters) must lie in `min..=max`
    String { min: usize, max: usize },
    /// A map of string to string
    Map,
    /// An unordered set of nested blocks
    Set(Schema),
}

/// Declaration of a single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub required: bool,
    /// Set by the service, never by configuration
    pub computed: bool,
    /// Changing the value requires replacing the resource
    pub force_new: bool,
}

impl Attribute {
    fn new(kind: AttributeKind, required: bool) -> Self {
        Self {
            kind,
            required,
            computed: false,
            force_new: false,
        }
    }

    pub fn required_string(min: usize, max: usize) -> Self {
        Self::new(AttributeKind::String { min, max }, true)
    }

    pub fn optional_string(min: usize, max: usize) -> Self {
        Self::new(AttributeKind::String { min, max }, false)
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::new(
                AttributeKind::String {
                    min: 0,
                    max: usize::MAX,
                },
                false,
            )
        }
    }

    pub fn required_set(block: Schema) -> Self {
        Self::new(AttributeKind::Set(block), true)
    }

    pub fn optional_set(block: Schema) -> Self {
        Self::new(AttributeKind::Set(block), false)
    }

    pub fn optional_map() -> Self {
        Self::new(AttributeKind::Map, false)
    }

    /// Marks the attribute as forcing replacement when changed
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

impl AttributeKind {
    fn describe(&self) -> &'static str {
        match self {
            AttributeKind::String { .. } => "a string",
            AttributeKind::Map => "a map of strings",
            AttributeKind::Set(_) => "a set of blocks",
        }
    }
}

/// A constraint breach found while validating configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path to the offending attribute (e.g. `pipeline_object.0.field.1.key`)
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Attribute declarations for one resource or nested block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(name, attribute)| (*name, attribute))
    }

    /// Validates a configuration bag, returning every violation found
    ///
    /// Set elements that are not objects are not reported here; the codec
    /// skips them with a diagnostic when expanding.
    pub fn validate(&self, bag: &Bag) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        self.validate_into("", bag, &mut violations);
        violations
    }

    fn validate_into(&self, prefix: &str, bag: &Bag, out: &mut Vec<SchemaViolation>) {
        for key in bag.keys() {
            if !self.attributes.contains_key(key.as_str()) {
                out.push(violation(&join(prefix, key), "unsupported attribute"));
            }
        }

        for (name, attribute) in &self.attributes {
            let path = join(prefix, name);
            let value = match bag.get(*name) {
                None | Some(Value::Null) => {
                    if attribute.required {
                        out.push(violation(&path, "required attribute is missing"));
                    }
                    continue;
                }
                Some(value) => value,
            };

            if attribute.computed {
                out.push(violation(&path, "attribute is computed and cannot be configured"));
                continue;
            }

            match (&attribute.kind, value) {
                (AttributeKind::String { min, max }, Value::String(s)) => {
                    let len = s.chars().count();
                    if len < *min || len > *max {
                        out.push(violation(
                            &path,
                            &format!("expected length between {} and {}, got {}", min, max, len),
                        ));
                    }
                }
                (AttributeKind::Map, Value::Object(map)) => {
                    for (key, v) in map {
                        if !v.is_string() {
                            out.push(violation(&join(&path, key), "expected a string"));
                        }
                    }
                }
                (AttributeKind::Set(block), Value::Array(items)) => {
                    if attribute.required && items.is_empty() {
                        out.push(violation(&path, "required attribute is missing"));
                    }
                    for (i, item) in items.iter().enumerate() {
                        if let Value::Object(element) = item {
                            block.validate_into(&join(&path, &i.to_string()), element, out);
                        }
                    }
                }
                (kind, _) => {
                    out.push(violation(&path, &format!("expected {}", kind.describe())));
                }
            }
        }
    }

    /// Checks that `value` has the shape declared for attribute `name`
    ///
    /// Only structure is checked, not length constraints. `null` is always
    /// accepted and means "clear the attribute".
    pub fn check_shape(&self, name: &str, value: &Value) -> Result<(), String> {
        let attribute = self
            .attribute(name)
            .ok_or_else(|| format!("attribute `{}` is not declared by the schema", name))?;

        check_kind(&attribute.kind, value).map_err(|e| format!("{}: {}", name, e))
    }

    /// Returns `bag` as the host reads it back from state
    ///
    /// Unset optional strings read as `""`, unset sets as `[]` and unset maps
    /// as `{}`. Required and computed attributes that are missing stay missing.
    pub fn observe(&self, bag: &Bag) -> Bag {
        let mut observed = bag.clone();

        for (name, attribute) in &self.attributes {
            if matches!(observed.get(*name), None | Some(Value::Null)) {
                if attribute.required || attribute.computed {
                    continue;
                }
                let empty = match attribute.kind {
                    AttributeKind::String { .. } => Value::String(String::new()),
                    AttributeKind::Map => Value::Object(Bag::new()),
                    AttributeKind::Set(_) => Value::Array(Vec::new()),
                };
                observed.insert(name.to_string(), empty);
                continue;
            }

            if let (AttributeKind::Set(block), Some(Value::Array(items))) =
                (&attribute.kind, observed.get_mut(*name))
            {
                for item in items.iter_mut() {
                    if let Value::Object(element) = item {
                        *element = block.observe(element);
                    }
                }
            }
        }

        observed
    }
}

fn check_kind(kind: &AttributeKind, value: &Value) -> Result<(), String> {
    match (kind, value) {
        (_, Value::Null) => Ok(()),
        (AttributeKind::String { .. }, Value::String(_)) => Ok(()),
        (AttributeKind::Map, Value::Object(map)) if map.values().all(Value::is_string) => Ok(()),
        (AttributeKind::Set(block), Value::Array(items)) => {
            for item in items {
                let Value::Object(element) = item else {
                    return Err("set element is not a block".to_string());
                };
                for (key, v) in element {
                    block.check_shape(key, v)?;
                }
            }
            Ok(())
        }
        (kind, _) => Err(format!("expected {}", kind.describe())),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn violation(path: &str, message: &str) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Schema of the pipeline definition resource
pub fn pipeline_definition_schema() -> Schema {
    let field = Schema::new()
        .with_attribute(attr::KEY, Attribute::required_string(1, 256))
        .with_attribute(attr::REF_VALUE, Attribute::optional_string(0, 256))
        .with_attribute(attr::STRING_VALUE, Attribute::optional_string(0, 10240));

    let pipeline_object = Schema::new()
        .with_attribute(attr::FIELD, Attribute::optional_set(field))
        .with_attribute(attr::ID, Attribute::required_string(1, 1024))
        .with_attribute(attr::NAME, Attribute::required_string(1, 1024));

    let parameter_attribute = Schema::new()
        .with_attribute(attr::KEY, Attribute::required_string(1, 256))
        .with_attribute(attr::STRING_VALUE, Attribute::required_string(0, 10240));

    let parameter_object = Schema::new()
        .with_attribute(attr::ATTRIBUTE, Attribute::optional_set(parameter_attribute))
        .with_attribute(attr::ID, Attribute::required_string(1, 256));

    let parameter_value = Schema::new()
        .with_attribute(attr::ID, Attribute::required_string(1, 256))
        .with_attribute(attr::STRING_VALUE, Attribute::required_string(0, 10240));

    Schema::new()
        .with_attribute(attr::PARAMETER_OBJECT, Attribute::optional_set(parameter_object))
        .with_attribute(attr::PARAMETER_VALUE, Attribute::optional_set(parameter_value))
        .with_attribute(
            attr::PIPELINE_ID,
            Attribute::required_string(1, 1024).force_new(),
        )
        .with_attribute(attr::PIPELINE_OBJECT, Attribute::required_set(pipeline_object))
}

/// Schema of the organization resource policy resource
pub fn resource_policy_schema() -> Schema {
    Schema::new()
        .with_attribute(attr::ARN, Attribute::computed_string())
        .with_attribute(attr::CONTENT, Attribute::required_string(1, 40960))
        .with_attribute(attr::TAGS, Attribute::optional_map())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Bag {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_valid_definition_has_no_violations() {
        let config = bag(json!({
            "pipeline_id": "df-0123",
            "pipeline_object": [{
                "id": "Default",
                "name": "Default",
                "field": [{ "key": "type", "string_value": "Default" }]
            }],
            "parameter_value": [{ "id": "myParam", "string_value": "" }]
        }));

        assert!(pipeline_definition_schema().validate(&config).is_empty());
    }

    #[test]
    fn test_empty_optional_strings_are_valid() {
        let config = bag(json!({
            "pipeline_id": "p1",
            "pipeline_object": [{
                "id": "o1",
                "name": "Default",
                "field": [{ "key": "type", "ref_value": "", "string_value": "Default" }]
            }]
        }));

        assert!(pipeline_definition_schema().validate(&config).is_empty());
    }

    #[test]
    fn test_missing_required_attributes_are_reported() {
        let violations = pipeline_definition_schema().validate(&bag(json!({})));
        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["pipeline_id", "pipeline_object"]);
    }

    #[test]
    fn test_nested_length_constraints() {
        let long_key = "k".repeat(257);
        let config = bag(json!({
            "pipeline_id": "p1",
            "pipeline_object": [{
                "id": "o1",
                "name": "",
                "field": [{ "key": long_key }]
            }]
        }));

        let violations = pipeline_definition_schema().validate(&config);
        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"pipeline_object.0.name"));
        assert!(paths.contains(&"pipeline_object.0.field.0.key"));
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_unsupported_and_computed_attributes() {
        let config = bag(json!({ "content": "{}", "arn": "arn:x", "colour": "blue" }));
        let violations = resource_policy_schema().validate(&config);

        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.path == "colour"));
        assert!(violations.iter().any(|v| v.path == "arn"));
    }

    #[test]
    fn test_check_shape() {
        let schema = pipeline_definition_schema();

        assert!(schema.check_shape("pipeline_id", &json!("p1")).is_ok());
        assert!(schema.check_shape("pipeline_object", &json!([])).is_ok());
        assert!(schema.check_shape("pipeline_object", &Value::Null).is_ok());
        assert!(schema.check_shape("pipeline_object", &json!("nope")).is_err());
        assert!(schema
            .check_shape("pipeline_object", &json!([{ "id": "o1", "colour": "x" }]))
            .is_err());
        assert!(schema.check_shape("unknown", &json!("x")).is_err());
    }

    #[test]
    fn test_observe_fills_unset_optionals() {
        let config = bag(json!({
            "pipeline_id": "p1",
            "pipeline_object": [{ "id": "o1", "name": "n", "field": [{ "key": "k" }] }]
        }));

        let observed = pipeline_definition_schema().observe(&config);
        assert_eq!(
            Value::Object(observed),
            json!({
                "pipeline_id": "p1",
                "parameter_object": [],
                "parameter_value": [],
                "pipeline_object": [{
                    "id": "o1",
                    "name": "n",
                    "field": [{ "key": "k", "ref_value": "", "string_value": "" }]
                }]
            })
        );
    }
}
