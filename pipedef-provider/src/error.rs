//! Resource operation errors
//!
//! Every variant names the operation, the resource kind and the resource id so
//! the message is actionable on its own.

use pipedef_client::ClientError;
use pipedef_core::validation::ValidationErrors;
use thiserror::Error;

use crate::state::ApplyFailure;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid configuration for {resource}: {}", .violations.join("; "))]
    InvalidConfig {
        resource: &'static str,
        violations: Vec<String>,
    },

    #[error("{operation} {resource}: resource has no id")]
    MissingId {
        operation: &'static str,
        resource: &'static str,
    },

    #[error("creating {resource} ({id}): {source}")]
    Submit {
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("validating after creation {resource} ({id}): {source}")]
    Validation {
        resource: &'static str,
        id: String,
        source: ValidationErrors,
    },

    #[error("validating after creation {resource} ({id}): definition rejected without details")]
    Rejected { resource: &'static str, id: String },

    #[error("activating {resource} ({id}): {source}")]
    Activate {
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("reading {resource} ({id}): {source}")]
    Read {
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("reading {resource} ({id}): not found right after creation: {source}")]
    GoneAfterCreate {
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("{resource} ({id}) not found")]
    NotFound {
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("{operation} {resource} ({id}): {source}")]
    Remote {
        operation: &'static str,
        resource: &'static str,
        id: String,
        source: ClientError,
    },

    #[error("setting state for {resource} ({id}): {}", describe(.failures))]
    Apply {
        resource: &'static str,
        id: String,
        failures: Vec<ApplyFailure>,
    },

    #[error("{operation} {resource} ({id}): operation cancelled")]
    Cancelled {
        operation: &'static str,
        resource: &'static str,
        id: String,
    },
}

impl ResourceError {
    /// Whether the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn describe(failures: &[ApplyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
