//! Organization resource policy resource
//!
//! An organization carries at most one resource policy, so remote calls are
//! addressed to the organization and the policy id only identifies it in state.

use pipedef_client::{ClientError, codes};
use pipedef_core::codec::Decoder;
use pipedef_core::codec::policy::{expand_resource_policy, flatten_resource_policy};
use pipedef_core::domain::policy::ResourcePolicy;
use pipedef_core::schema::{Schema, resource_policy_schema};
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::OperationContext;
use crate::error::ResourceError;
use crate::repository::ResourcePolicyRepository;
use crate::state::ResourceData;

const RESOURCE: &str = "organization resource policy";

/// Identifier used in errors when no policy id is known yet
const ORGANIZATION: &str = "organization";

/// Reads the organization's resource policy
///
/// Fails with [`ResourceError::NotFound`] when no policy is attached.
pub async fn find_resource_policy(
    repo: &dyn ResourcePolicyRepository,
    ctx: &OperationContext,
) -> Result<ResourcePolicy, ResourceError> {
    let result = ctx
        .guard(repo.describe())
        .await
        .map_err(|_| cancelled("reading", ORGANIZATION))?;

    result.map_err(|source| {
        if is_missing(&source) {
            ResourceError::NotFound {
                resource: RESOURCE,
                id: ORGANIZATION.to_string(),
                source,
            }
        } else {
            ResourceError::Remote {
                operation: "reading",
                resource: RESOURCE,
                id: ORGANIZATION.to_string(),
                source,
            }
        }
    })
}

pub struct ResourcePolicyResource {
    repo: Arc<dyn ResourcePolicyRepository>,
}

impl ResourcePolicyResource {
    pub fn new(repo: Arc<dyn ResourcePolicyRepository>) -> Self {
        Self { repo }
    }

    pub fn schema() -> Schema {
        resource_policy_schema()
    }

    pub fn import(policy_id: &str) -> ResourceData {
        ResourceData::import(Self::schema(), policy_id)
    }

    pub async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let policy = self.put(ctx, data, "creating").await?;
        info!(policy_id = %policy.id, "Attached organization resource policy");

        data.set_id(policy.id);
        self.read(ctx, data).await
    }

    pub async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let id = require_id(data, "updating")?;
        let policy = self.put(ctx, data, "updating").await?;
        if policy.id != id {
            warn!(old = %id, new = %policy.id, "Resource policy id changed on update");
            data.set_id(policy.id);
        }

        self.read(ctx, data).await
    }

    async fn put(
        &self,
        ctx: &OperationContext,
        data: &ResourceData,
        operation: &'static str,
    ) -> Result<ResourcePolicy, ResourceError> {
        let id = data.id().unwrap_or(ORGANIZATION).to_string();
        let config = data.config();
        let violations = data.schema().validate(&config);
        if !violations.is_empty() {
            return Err(ResourceError::InvalidConfig {
                resource: RESOURCE,
                violations: violations.iter().map(ToString::to_string).collect(),
            });
        }

        let mut decoder = Decoder::new();
        let Some(request) = expand_resource_policy(&mut decoder, &config) else {
            return Err(ResourceError::InvalidConfig {
                resource: RESOURCE,
                violations: decoder
                    .diagnostics()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            });
        };

        ctx.guard(self.repo.put(&request))
            .await
            .map_err(|_| cancelled(operation, &id))?
            .map_err(|source| ResourceError::Remote {
                operation,
                resource: RESOURCE,
                id,
                source,
            })
    }

    pub async fn read(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let id = require_id(data, "reading")?;

        let policy = match find_resource_policy(self.repo.as_ref(), ctx).await {
            Ok(policy) => policy,
            Err(err) if err.is_not_found() && !data.is_new_resource() => {
                warn!(policy_id = %id, "Organization resource policy not found, removing from state");
                data.clear_id();
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let mut failures = Vec::new();
        for (name, value) in flatten_resource_policy(&policy) {
            if let Err(failure) = data.set(name, value) {
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

    /// Detaches the policy; one that is already gone counts as deleted
    pub async fn delete(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let id = require_id(data, "deleting")?;

        let result = ctx
            .guard(self.repo.delete())
            .await
            .map_err(|_| cancelled("deleting", &id))?;

        match result {
            Ok(()) => {}
            Err(source) if is_missing(&source) => {}
            Err(source) => {
                return Err(ResourceError::Remote {
                    operation: "deleting",
                    resource: RESOURCE,
                    id,
                    source,
                });
            }
        }

        info!(policy_id = %id, "Detached organization resource policy");
        data.clear_id();
        Ok(())
    }
}

fn is_missing(err: &ClientError) -> bool {
    err.is_code(codes::RESOURCE_POLICY_NOT_FOUND) || err.is_not_found()
}

fn require_id(data: &ResourceData, operation: &'static str) -> Result<String, ResourceError> {
    data.id()
        .map(str::to_string)
        .ok_or(ResourceError::MissingId {
            operation,
            resource: RESOURCE,
        })
}

fn cancelled(operation: &'static str, id: &str) -> ResourceError {
    ResourceError::Cancelled {
        operation,
        resource: RESOURCE,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipedef_core::Bag;
    use pipedef_core::dto::policy::PutResourcePolicy;
    use pipedef_core::schema::attr;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory organization holding at most one policy
    #[derive(Default)]
    struct InMemoryPolicies {
        policy: Mutex<Option<ResourcePolicy>>,
        puts: Mutex<Vec<PutResourcePolicy>>,
    }

    #[async_trait]
    impl ResourcePolicyRepository for InMemoryPolicies {
        async fn describe(&self) -> pipedef_client::Result<ResourcePolicy> {
            self.policy.lock().unwrap().clone().ok_or_else(not_found)
        }

        async fn put(&self, req: &PutResourcePolicy) -> pipedef_client::Result<ResourcePolicy> {
            self.puts.lock().unwrap().push(req.clone());
            let policy = ResourcePolicy {
                id: "rp-1234".to_string(),
                arn: "arn:aws:organizations::123456789012:resourcepolicy/o-abc/rp-1234"
                    .to_string(),
                content: req.content.clone(),
                tags: req.tags.clone(),
            };
            *self.policy.lock().unwrap() = Some(policy.clone());
            Ok(policy)
        }

        async fn delete(&self) -> pipedef_client::Result<()> {
            self.policy
                .lock()
                .unwrap()
                .take()
                .map(|_| ())
                .ok_or_else(not_found)
        }
    }

    fn not_found() -> ClientError {
        ClientError::coded(400, codes::RESOURCE_POLICY_NOT_FOUND, "no policy attached")
    }

    fn config(content: &str) -> Bag {
        match json!({ "content": content, "tags": { "team": "data" } }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn context() -> OperationContext {
        OperationContext::new(Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_create_sets_id_and_computed_arn() {
        let repo = Arc::new(InMemoryPolicies::default());
        let resource = ResourcePolicyResource::new(repo.clone());

        let mut data = ResourceData::from_config(resource_policy_schema(), config("{}"));
        resource.create(&context(), &mut data).await.unwrap();

        assert_eq!(data.id(), Some("rp-1234"));
        assert!(data.get_str(attr::ARN).unwrap().ends_with("/rp-1234"));
        assert_eq!(data.get(attr::TAGS), Some(&json!({ "team": "data" })));
        assert_eq!(
            repo.puts.lock().unwrap()[0].tags,
            BTreeMap::from([("team".to_string(), "data".to_string())])
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config() {
        let repo = Arc::new(InMemoryPolicies::default());
        let resource = ResourcePolicyResource::new(repo.clone());

        let mut data = ResourceData::from_config(resource_policy_schema(), config(""));
        let err = resource.create(&context(), &mut data).await.unwrap_err();

        assert!(matches!(err, ResourceError::InvalidConfig { .. }));
        assert!(repo.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_content() {
        let repo = Arc::new(InMemoryPolicies::default());
        let resource = ResourcePolicyResource::new(repo.clone());

        let mut data = ResourceData::from_config(resource_policy_schema(), config("{}"));
        resource.create(&context(), &mut data).await.unwrap();

        let updated = r#"{"Version":"2012-10-17"}"#;
        data.set(attr::CONTENT, json!(updated)).unwrap();
        resource.update(&context(), &mut data).await.unwrap();

        assert_eq!(data.get_str(attr::CONTENT), Some(updated));
        assert!(data.get_str(attr::ARN).unwrap().ends_with("/rp-1234"));
        assert_eq!(repo.puts.lock().unwrap().len(), 2);
        assert_eq!(repo.puts.lock().unwrap()[1].content, updated);
    }

    #[tokio::test]
    async fn test_find_missing_policy_is_not_found() {
        let repo = InMemoryPolicies::default();
        let err = find_resource_policy(&repo, &context()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_missing_policy_clears_state() {
        let repo = Arc::new(InMemoryPolicies::default());
        let resource = ResourcePolicyResource::new(repo);

        let mut data = ResourcePolicyResource::import("rp-1234");
        resource.read(&context(), &mut data).await.unwrap();
        assert_eq!(data.id(), None);
    }

    #[tokio::test]
    async fn test_delete_detaches_and_tolerates_missing() {
        let repo = Arc::new(InMemoryPolicies::default());
        let resource = ResourcePolicyResource::new(repo.clone());

        let mut data = ResourceData::from_config(resource_policy_schema(), config("{}"));
        resource.create(&context(), &mut data).await.unwrap();
        resource.delete(&context(), &mut data).await.unwrap();

        assert_eq!(data.id(), None);
        assert!(repo.policy.lock().unwrap().is_none());

        let mut stale = ResourcePolicyResource::import("rp-1234");
        resource.delete(&context(), &mut stale).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_without_id() {
        let resource = ResourcePolicyResource::new(Arc::new(InMemoryPolicies::default()));
        let mut data = ResourceData::from_config(resource_policy_schema(), Bag::new());

        let err = resource.delete(&context(), &mut data).await.unwrap_err();
        assert!(matches!(err, ResourceError::MissingId { .. }));
    }
}
