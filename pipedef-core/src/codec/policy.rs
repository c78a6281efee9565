//! Resource policy expand/flatten

use serde_json::Value;
use std::collections::BTreeMap;

use super::{Decoder, join};
use crate::Bag;
use crate::domain::policy::ResourcePolicy;
use crate::dto::policy::PutResourcePolicy;
use crate::schema::attr;

/// Builds a put request from a configuration bag
///
/// Returns `None` when `content` is missing; tags that are not strings are
/// skipped with a diagnostic.
pub fn expand_resource_policy(decoder: &mut Decoder, bag: &Bag) -> Option<PutResourcePolicy> {
    let content = decoder.required_string(attr::CONTENT, bag, attr::CONTENT)?;

    let mut tags = BTreeMap::new();
    match bag.get(attr::TAGS) {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (key, value) in map {
                match value {
                    Value::String(s) => {
                        tags.insert(key.clone(), s.clone());
                    }
                    _ => decoder.skip(join(attr::TAGS, key), "tag value is not a string"),
                }
            }
        }
        Some(_) => decoder.skip(attr::TAGS.to_string(), "expected a map of strings"),
    }

    Some(PutResourcePolicy { content, tags })
}

/// Flattens a policy into `(attribute, value)` pairs
pub fn flatten_resource_policy(policy: &ResourcePolicy) -> Vec<(&'static str, Value)> {
    let tags: Bag = policy
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    vec![
        (attr::ARN, Value::String(policy.arn.clone())),
        (attr::CONTENT, Value::String(policy.content.clone())),
        (attr::TAGS, Value::Object(tags)),
    ]
}
