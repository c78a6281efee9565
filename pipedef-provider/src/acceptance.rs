//! State checks for end-to-end runs
//!
//! After an apply the host's state is captured as a [`StateSnapshot`]; the
//! checks here compare it against what the management API reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::context::OperationContext;
use crate::error::ResourceError;
use crate::repository::ResourcePolicyRepository;
use crate::resource::find_resource_policy;
use crate::state::ResourceData;
use pipedef_core::Bag;
use pipedef_core::domain::policy::ResourcePolicy;

/// Resource type names as they appear in state
pub mod types {
    pub const PIPELINE_DEFINITION: &str = "pipedef_pipeline_definition";
    pub const RESOURCE_POLICY: &str = "pipedef_organization_resource_policy";
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("not found in state: {0}")]
    NotInState(String),

    #[error("{address} has no id in state")]
    NoId { address: String },

    #[error("organization resource policy {0} still exists")]
    StillExists(String),

    #[error(transparent)]
    Lookup(#[from] ResourceError),
}

/// One tracked resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub primary_id: Option<String>,
    pub attributes: Bag,
}

impl ResourceSnapshot {
    pub fn from_data(resource_type: &str, data: &ResourceData) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            primary_id: data.id().map(str::to_string),
            attributes: data.snapshot(),
        }
    }
}

/// Tracked resources keyed by address (`<type>.<name>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    resources: BTreeMap<String, ResourceSnapshot>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: impl Into<String>, resource: ResourceSnapshot) {
        self.resources.insert(address.into(), resource);
    }

    pub fn get(&self, address: &str) -> Option<&ResourceSnapshot> {
        self.resources.get(address)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceSnapshot)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Checks that `address` is tracked and the organization has a policy
pub async fn check_resource_policy_exists(
    repo: &dyn ResourcePolicyRepository,
    ctx: &OperationContext,
    state: &StateSnapshot,
    address: &str,
) -> Result<ResourcePolicy, CheckError> {
    let resource = state
        .get(address)
        .ok_or_else(|| CheckError::NotInState(address.to_string()))?;
    if resource.primary_id.is_none() {
        return Err(CheckError::NoId {
            address: address.to_string(),
        });
    }

    Ok(find_resource_policy(repo, ctx).await?)
}

/// Checks that no tracked resource policy is still attached
pub async fn check_resource_policy_destroyed(
    repo: &dyn ResourcePolicyRepository,
    ctx: &OperationContext,
    state: &StateSnapshot,
) -> Result<(), CheckError> {
    for (_, resource) in state.resources() {
        if resource.resource_type != types::RESOURCE_POLICY {
            continue;
        }

        match find_resource_policy(repo, ctx).await {
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err.into()),
            Ok(_) => {
                let id = resource.primary_id.clone().unwrap_or_default();
                return Err(CheckError::StillExists(id));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourcePolicyResource;
    use async_trait::async_trait;
    use pipedef_client::{ClientError, codes};
    use pipedef_core::dto::policy::PutResourcePolicy;
    use pipedef_core::schema::resource_policy_schema;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Organization {
        policy: Mutex<Option<ResourcePolicy>>,
        unavailable: bool,
    }

    #[async_trait]
    impl ResourcePolicyRepository for Organization {
        async fn describe(&self) -> pipedef_client::Result<ResourcePolicy> {
            if self.unavailable {
                return Err(ClientError::api_error(503, "unavailable"));
            }
            self.policy.lock().unwrap().clone().ok_or_else(|| {
                ClientError::coded(400, codes::RESOURCE_POLICY_NOT_FOUND, "none")
            })
        }

        async fn put(&self, req: &PutResourcePolicy) -> pipedef_client::Result<ResourcePolicy> {
            let policy = ResourcePolicy {
                id: "rp-1".to_string(),
                arn: "arn:aws:organizations::1:resourcepolicy/o-1/rp-1".to_string(),
                content: req.content.clone(),
                tags: req.tags.clone(),
            };
            *self.policy.lock().unwrap() = Some(policy.clone());
            Ok(policy)
        }

        async fn delete(&self) -> pipedef_client::Result<()> {
            self.policy.lock().unwrap().take();
            Ok(())
        }
    }

    fn context() -> OperationContext {
        OperationContext::new(Duration::from_secs(60))
    }

    const ADDRESS: &str = "pipedef_organization_resource_policy.test";

    async fn applied(repo: Arc<Organization>) -> (ResourcePolicyResource, ResourceData, StateSnapshot) {
        let resource = ResourcePolicyResource::new(repo);
        let config = match json!({ "content": "{\"Version\":\"2012-10-17\"}" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let mut data = ResourceData::from_config(resource_policy_schema(), config);
        resource.create(&context(), &mut data).await.unwrap();

        let mut state = StateSnapshot::new();
        state.insert(
            ADDRESS,
            ResourceSnapshot::from_data(types::RESOURCE_POLICY, &data),
        );
        (resource, data, state)
    }

    #[tokio::test]
    async fn test_exists_after_apply() {
        let repo = Arc::new(Organization::default());
        let (_, _, state) = applied(repo.clone()).await;

        let policy = check_resource_policy_exists(repo.as_ref(), &context(), &state, ADDRESS)
            .await
            .unwrap();
        assert_eq!(policy.id, "rp-1");
        assert!(policy.arn.contains(":resourcepolicy/o-"));

        let resource = state.get(ADDRESS).unwrap();
        assert_eq!(resource.attributes.get("tags"), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_exists_unknown_address() {
        let repo = Organization::default();
        let err = check_resource_policy_exists(&repo, &context(), &StateSnapshot::new(), ADDRESS)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::NotInState(_)));
    }

    #[tokio::test]
    async fn test_destroyed_after_delete() {
        let repo = Arc::new(Organization::default());
        let (resource, mut data, state) = applied(repo.clone()).await;

        let err = check_resource_policy_destroyed(repo.as_ref(), &context(), &state)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "organization resource policy rp-1 still exists"
        );

        resource.delete(&context(), &mut data).await.unwrap();
        check_resource_policy_destroyed(repo.as_ref(), &context(), &state)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_destroyed_skips_other_types_and_surfaces_errors() {
        let repo = Organization {
            unavailable: true,
            ..Default::default()
        };

        let mut state = StateSnapshot::new();
        state.insert(
            "pipedef_pipeline_definition.test",
            ResourceSnapshot {
                resource_type: types::PIPELINE_DEFINITION.to_string(),
                primary_id: Some("p1".to_string()),
                attributes: Bag::new(),
            },
        );
        check_resource_policy_destroyed(&repo, &context(), &state)
            .await
            .unwrap();

        state.insert(
            ADDRESS,
            ResourceSnapshot {
                resource_type: types::RESOURCE_POLICY.to_string(),
                primary_id: Some("rp-1".to_string()),
                attributes: Bag::new(),
            },
        );
        let err = check_resource_policy_destroyed(&repo, &context(), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Lookup(_)));
    }
}
