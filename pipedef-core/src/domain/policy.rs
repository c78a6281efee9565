//! Organization resource policy domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The resource-based policy attached to an organization
///
/// There is at most one per organization, so the service addresses it
/// without an id; `id` is assigned by the service on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePolicy {
    pub id: String,
    pub arn: String,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
