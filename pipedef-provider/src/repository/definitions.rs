//! Pipeline definitions repository
//!
//! Handles the remote calls behind the pipeline definition resource:
//! - Submitting a definition
//! - Activating a pipeline
//! - Reading the stored definition

use async_trait::async_trait;
use pipedef_client::{ManagementClient, Result};
use pipedef_core::dto::pipeline::{
    PipelineDefinitionOutput, PutPipelineDefinition, PutPipelineDefinitionOutput,
};

/// Repository trait for pipeline definition operations
#[async_trait]
pub trait DefinitionRepository: Send + Sync {
    /// Submits a full definition, replacing whatever is stored
    async fn put_definition(
        &self,
        req: &PutPipelineDefinition,
    ) -> Result<PutPipelineDefinitionOutput>;

    /// Makes a validated definition live
    async fn activate(&self, pipeline_id: &str) -> Result<()>;

    /// Reads the stored definition
    async fn get_definition(&self, pipeline_id: &str) -> Result<PipelineDefinitionOutput>;
}

#[async_trait]
impl DefinitionRepository for ManagementClient {
    async fn put_definition(
        &self,
        req: &PutPipelineDefinition,
    ) -> Result<PutPipelineDefinitionOutput> {
        self.put_pipeline_definition(req).await
    }

    async fn activate(&self, pipeline_id: &str) -> Result<()> {
        self.activate_pipeline(pipeline_id).await
    }

    async fn get_definition(&self, pipeline_id: &str) -> Result<PipelineDefinitionOutput> {
        self.get_pipeline_definition(pipeline_id).await
    }
}
