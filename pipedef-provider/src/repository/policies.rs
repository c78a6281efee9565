//! Resource policy repository

use async_trait::async_trait;
use pipedef_client::{ManagementClient, Result};
use pipedef_core::domain::policy::ResourcePolicy;
use pipedef_core::dto::policy::PutResourcePolicy;

/// Repository trait for the organization resource policy
#[async_trait]
pub trait ResourcePolicyRepository: Send + Sync {
    async fn describe(&self) -> Result<ResourcePolicy>;

    async fn put(&self, req: &PutResourcePolicy) -> Result<ResourcePolicy>;

    async fn delete(&self) -> Result<()>;
}

#[async_trait]
impl ResourcePolicyRepository for ManagementClient {
    async fn describe(&self) -> Result<ResourcePolicy> {
        self.describe_resource_policy().await
    }

    async fn put(&self, req: &PutResourcePolicy) -> Result<ResourcePolicy> {
        self.put_resource_policy(req).await
    }

    async fn delete(&self) -> Result<()> {
        self.delete_resource_policy().await
    }
}
