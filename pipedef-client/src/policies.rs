//! Organization resource policy API endpoints

use pipedef_core::domain::policy::ResourcePolicy;
use pipedef_core::dto::policy::PutResourcePolicy;
use reqwest::Method;
use tracing::debug;

use crate::ManagementClient;
use crate::error::Result;

impl ManagementClient {
    // =============================================================================
    // Resource Policy
    // =============================================================================

    fn resource_policy_url(&self) -> String {
        format!("{}/api/organization/resource-policy", self.base_url)
    }

    /// Describe the organization's resource policy
    pub async fn describe_resource_policy(&self) -> Result<ResourcePolicy> {
        debug!("Describing organization resource policy");
        let response = self
            .request(Method::GET, &self.resource_policy_url())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Attach or replace the organization's resource policy
    ///
    /// # Arguments
    /// * `req` - Policy content and tags
    pub async fn put_resource_policy(&self, req: &PutResourcePolicy) -> Result<ResourcePolicy> {
        debug!(tags = req.tags.len(), "Putting organization resource policy");
        let response = self
            .request(Method::PUT, &self.resource_policy_url())
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete the organization's resource policy
    pub async fn delete_resource_policy(&self) -> Result<()> {
        debug!("Deleting organization resource policy");
        let response = self
            .request(Method::DELETE, &self.resource_policy_url())
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_put_and_describe() {
        let server = MockServer::start().await;
        let body = json!({
            "id": "rp-12345678",
            "arn": "arn:aws:organizations::111111111111:resourcepolicy/o-abcdef/rp-12345678",
            "content": "{\"Version\":\"2012-10-17\"}",
            "tags": {}
        });

        Mock::given(method("PUT"))
            .and(path("/api/organization/resource-policy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/organization/resource-policy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri());
        let created = client
            .put_resource_policy(&PutResourcePolicy {
                content: "{\"Version\":\"2012-10-17\"}".to_string(),
                tags: BTreeMap::new(),
            })
            .await
            .unwrap();
        let described = client.describe_resource_policy().await.unwrap();

        assert_eq!(created, described);
        assert_eq!(described.id, "rp-12345678");
    }

    #[tokio::test]
    async fn test_delete_missing_policy() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/organization/resource-policy"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "ResourcePolicyNotFoundException",
                "message": "no resource policy"
            })))
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri());
        let err = client.delete_resource_policy().await.unwrap_err();

        assert!(err.is_code(codes::RESOURCE_POLICY_NOT_FOUND));
        assert!(err.is_not_found());
    }
}
