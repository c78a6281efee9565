//! Resources
//!
//! Each resource maps an attribute bag onto management API calls:
//! - Pipeline definition: put (submit, retry, activate), read, no-op delete, import
//! - Organization resource policy: create, read, update, delete

pub mod pipeline_definition;
pub mod resource_policy;

pub use pipeline_definition::PipelineDefinitionResource;
pub use resource_policy::{ResourcePolicyResource, find_resource_policy};
