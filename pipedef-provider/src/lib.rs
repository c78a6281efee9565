//! Pipedef Provider
//!
//! Resource lifecycles over the management API.
//!
//! This crate contains:
//! - Resources: pipeline definition and organization resource policy
//! - Repositories: the remote seam each resource calls through
//! - State: the host's per-resource record and operation context
//! - Acceptance checks: compare captured state against the service

pub mod acceptance;
pub mod config;
pub mod context;
pub mod error;
pub mod repository;
pub mod resource;
pub mod retry;
pub mod state;

pub use config::Config;
pub use context::{CancellationToken, OperationContext, ResourceTimeouts};
pub use error::ResourceError;
pub use resource::{PipelineDefinitionResource, ResourcePolicyResource};
pub use state::ResourceData;
