//! Resource state
//!
//! `ResourceData` is the host's per-resource record: the identifier, the
//! attribute bag (configuration on the way in, observed state on the way out)
//! and whether the resource is being created in the current operation.

use pipedef_core::Bag;
use pipedef_core::schema::Schema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// An attribute the host refused to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub attribute: String,
    pub reason: String,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "setting `{}`: {}", self.attribute, self.reason)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Schema,
    id: Option<String>,
    attributes: Bag,
    /// Keys written from the service rather than from configuration
    observed: BTreeSet<String>,
    new_resource: bool,
}

impl ResourceData {
    /// Record for a resource about to be created from `config`
    pub fn from_config(schema: Schema, config: Bag) -> Self {
        Self {
            schema,
            id: None,
            attributes: config,
            observed: BTreeSet::new(),
            new_resource: true,
        }
    }

    /// Record for a resource already tracked under `id`
    pub fn from_state(schema: Schema, id: impl Into<String>, attributes: Bag) -> Self {
        Self {
            schema,
            id: Some(id.into()),
            observed: attributes.keys().cloned().collect(),
            attributes,
            new_resource: false,
        }
    }

    /// Record for an imported resource: only the identifier is known
    pub fn import(schema: Schema, id: impl Into<String>) -> Self {
        Self::from_state(schema, id, Bag::new())
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Marks the resource as gone; the host drops it from state
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_new_resource(&self) -> bool {
        self.new_resource
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn attributes(&self) -> &Bag {
        &self.attributes
    }

    /// The bag as configuration sees it
    ///
    /// Computed attributes stored from the service are left out; one that
    /// arrived through configuration stays, so validation still rejects it.
    pub fn config(&self) -> Bag {
        self.attributes
            .iter()
            .filter(|(key, _)| {
                let computed = self
                    .schema
                    .attribute(key)
                    .is_some_and(|attribute| attribute.computed);
                !(computed && self.observed.contains(key.as_str()))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Stores `value` under `key` after checking it against the schema
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ApplyFailure> {
        self.schema
            .check_shape(key, &value)
            .map_err(|reason| ApplyFailure {
                attribute: key.to_string(),
                reason,
            })?;

        self.attributes.insert(key.to_string(), value);
        self.observed.insert(key.to_string());
        Ok(())
    }

    /// The state as the host reports it, with unset optionals filled in
    pub fn snapshot(&self) -> Bag {
        self.schema.observe(&self.attributes)
    }
}
