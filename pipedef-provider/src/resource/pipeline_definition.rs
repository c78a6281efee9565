//! Pipeline definition resource
//!
//! Create and update share one path: the whole definition is submitted,
//! resubmitted while the service reports a transient failure, activated, and
//! then read back so state reflects the service's own record rather than the
//! local configuration. Delete is a no-op; the pipeline itself is owned by a
//! separate resource.

use pipedef_client::{ClientError, codes};
use pipedef_core::codec::Decoder;
use pipedef_core::codec::pipeline::{expand_put_definition, flatten_definition};
use pipedef_core::dto::pipeline::{PutPipelineDefinition, PutPipelineDefinitionOutput};
use pipedef_core::schema::{Schema, attr, pipeline_definition_schema};
use pipedef_core::validation::ValidationErrors;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::context::OperationContext;
use crate::error::ResourceError;
use crate::repository::DefinitionRepository;
use crate::retry::{RetryPolicy, RoleKeywordClassifier, TransientClassifier};
use crate::state::ResourceData;

const RESOURCE: &str = "pipeline definition";

/// Outcome of a single submission
enum Attempt {
    /// Accepted and validated by the service
    Validated(PutPipelineDefinitionOutput),
    /// Rejected in a way expected to clear up on its own
    Transient(ResourceError),
    /// Rejected for good
    Failed(ResourceError),
}

pub struct PipelineDefinitionResource {
    repo: Arc<dyn DefinitionRepository>,
    retry: RetryPolicy,
    classifier: Arc<dyn TransientClassifier>,
}

impl PipelineDefinitionResource {
    pub fn new(repo: Arc<dyn DefinitionRepository>) -> Self {
        Self {
            repo,
            retry: RetryPolicy::default(),
            classifier: Arc::new(RoleKeywordClassifier::default()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the rule deciding which validation failures are retried
    pub fn with_classifier(mut self, classifier: Arc<dyn TransientClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn schema() -> Schema {
        pipeline_definition_schema()
    }

    /// Starts tracking an existing pipeline's definition; the id is the pipeline id
    pub fn import(pipeline_id: &str) -> ResourceData {
        ResourceData::import(Self::schema(), pipeline_id)
    }

    pub async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        self.put(ctx, data).await
    }

    /// Same path as create; callers pass the create timeout
    pub async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        self.put(ctx, data).await
    }

    /// Submits, activates and reads back the configured definition
    pub async fn put(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let config = data.config();
        let violations = data.schema().validate(&config);
        if !violations.is_empty() {
            return Err(ResourceError::InvalidConfig {
                resource: RESOURCE,
                violations: violations.iter().map(ToString::to_string).collect(),
            });
        }

        // Presence is guaranteed by validation.
        let pipeline_id = config
            .get(attr::PIPELINE_ID)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut decoder = Decoder::new();
        let input = expand_put_definition(&mut decoder, &pipeline_id, &config);
        if !decoder.diagnostics().is_empty() {
            debug!(
                pipeline_id = %pipeline_id,
                skipped = decoder.diagnostics().len(),
                "Submitting definition without malformed elements"
            );
        }

        let output = self.submit(ctx, &input).await?;
        for warning in &output.validation_warnings {
            warn!(
                pipeline_id = %pipeline_id,
                object_id = %warning.id,
                warnings = ?warning.warnings,
                "Definition accepted with validation warnings"
            );
        }

        info!(pipeline_id = %pipeline_id, "Activating pipeline");
        ctx.guard(self.repo.activate(&pipeline_id))
            .await
            .map_err(|_| cancelled("activating", &pipeline_id))?
            .map_err(|source| ResourceError::Activate {
                resource: RESOURCE,
                id: pipeline_id.clone(),
                source,
            })?;

        data.set_id(pipeline_id);
        self.read(ctx, data).await
    }

    /// Submits the definition, resubmitting transient failures until the budget runs out
    ///
    /// Once the budget is spent exactly one more attempt is made and its
    /// outcome is returned as is.
    async fn submit(
        &self,
        ctx: &OperationContext,
        input: &PutPipelineDefinition,
    ) -> Result<PutPipelineDefinitionOutput, ResourceError> {
        let deadline = Instant::now() + ctx.timeout;
        let mut delay = self.retry.initial_delay;
        let mut attempt: u32 = 1;

        loop {
            let cause = match self.attempt(ctx, input).await? {
                Attempt::Validated(output) => return Ok(output),
                Attempt::Failed(err) => return Err(err),
                Attempt::Transient(err) => err,
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let wait = delay.min(remaining);
            warn!(
                pipeline_id = %input.pipeline_id,
                attempt,
                delay_ms = wait.as_millis() as u64,
                error = %cause,
                "Transient failure submitting definition, retrying"
            );
            ctx.sleep(wait)
                .await
                .map_err(|_| cancelled("creating", &input.pipeline_id))?;

            if Instant::now() >= deadline {
                break;
            }
            delay = self.retry.next_delay(delay);
            attempt += 1;
        }

        info!(
            pipeline_id = %input.pipeline_id,
            attempts = attempt,
            "Retry budget exhausted, making one final attempt"
        );
        match self.attempt(ctx, input).await? {
            Attempt::Validated(output) => Ok(output),
            Attempt::Transient(err) | Attempt::Failed(err) => Err(err),
        }
    }

    /// One submission and its classification; errors only on cancellation
    async fn attempt(
        &self,
        ctx: &OperationContext,
        input: &PutPipelineDefinition,
    ) -> Result<Attempt, ResourceError> {
        let id = &input.pipeline_id;
        let result = ctx
            .guard(self.repo.put_definition(input))
            .await
            .map_err(|_| cancelled("creating", id))?;

        let output = match result {
            Ok(output) => output,
            Err(source) if source.is_code(codes::INTERNAL_SERVICE_ERROR) => {
                return Ok(Attempt::Transient(submit_error(id, source)));
            }
            Err(source) => return Ok(Attempt::Failed(submit_error(id, source))),
        };

        if !output.errored {
            return Ok(Attempt::Validated(output));
        }

        let Some(errors) = ValidationErrors::aggregate(&output.validation_errors) else {
            return Ok(Attempt::Failed(ResourceError::Rejected {
                resource: RESOURCE,
                id: id.clone(),
            }));
        };

        let transient = self.classifier.is_transient_validation(&errors);
        let err = ResourceError::Validation {
            resource: RESOURCE,
            id: id.clone(),
            source: errors,
        };

        Ok(if transient {
            Attempt::Transient(err)
        } else {
            Attempt::Failed(err)
        })
    }

    /// Refreshes state from the stored definition
    ///
    /// A pipeline that no longer exists is dropped from state, unless it was
    /// created in this same operation.
    pub async fn read(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let id = data
            .id()
            .ok_or(ResourceError::MissingId {
                operation: "reading",
                resource: RESOURCE,
            })?
            .to_string();

        let result = ctx
            .guard(self.repo.get_definition(&id))
            .await
            .map_err(|_| cancelled("reading", &id))?;

        let output = match result {
            Ok(output) => output,
            Err(source) if is_gone(&source) => {
                if data.is_new_resource() {
                    return Err(ResourceError::GoneAfterCreate {
                        resource: RESOURCE,
                        id,
                        source,
                    });
                }
                warn!(pipeline_id = %id, "Pipeline definition not found, removing from state");
                data.clear_id();
                return Ok(());
            }
            Err(source) => {
                return Err(ResourceError::Read {
                    resource: RESOURCE,
                    id,
                    source,
                });
            }
        };

        let mut failures = Vec::new();
        let mut attributes = flatten_definition(&output);
        attributes.push((attr::PIPELINE_ID, Value::String(id.clone())));

        for (name, value) in attributes {
            if let Err(failure) = data.set(name, value) {
                warn!(pipeline_id = %id, error = %failure, "Failed to apply attribute");
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::Apply {
                resource: RESOURCE,
                id,
                failures,
            })
        }
    }

    /// Stops tracking the definition; the pipeline is left untouched
    pub async fn delete(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        debug!(pipeline_id = ?data.id(), "Removing pipeline definition from state");
        data.clear_id();
        Ok(())
    }
}

fn is_gone(err: &ClientError) -> bool {
    err.is_code(codes::PIPELINE_NOT_FOUND) || err.is_code(codes::PIPELINE_DELETED)
}

fn submit_error(id: &str, source: ClientError) -> ResourceError {
    ResourceError::Submit {
        resource: RESOURCE,
        id: id.to_string(),
        source,
    }
}

fn cancelled(operation: &'static str, id: &str) -> ResourceError {
    ResourceError::Cancelled {
        operation,
        resource: RESOURCE,
        id: id.to_string(),
    }
}
