//! Resource policy DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to attach (or replace) the organization resource policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutResourcePolicy {
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}
