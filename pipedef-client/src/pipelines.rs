//! Pipeline definition API endpoints

use pipedef_core::dto::pipeline::{
    PipelineDefinitionOutput, PutPipelineDefinition, PutPipelineDefinitionOutput,
};
use reqwest::Method;
use tracing::debug;

use crate::ManagementClient;
use crate::error::Result;

impl ManagementClient {
    // =============================================================================
    // Pipeline Definitions
    // =============================================================================

    /// Submit a pipeline definition, replacing any existing one
    ///
    /// A successful response may still report `errored`; the service validates
    /// the definition as part of the call.
    ///
    /// # Arguments
    /// * `req` - The full definition to submit
    pub async fn put_pipeline_definition(
        &self,
        req: &PutPipelineDefinition,
    ) -> Result<PutPipelineDefinitionOutput> {
        let url = format!(
            "{}/api/pipelines/{}/definition",
            self.base_url, req.pipeline_id
        );
        debug!(pipeline_id = %req.pipeline_id, objects = req.pipeline_objects.len(), "Submitting pipeline definition");
        let response = self.request(Method::PUT, &url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Activate a pipeline whose definition has been validated
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline to activate
    pub async fn activate_pipeline(&self, pipeline_id: &str) -> Result<()> {
        let url = format!("{}/api/pipelines/{}/activate", self.base_url, pipeline_id);
        debug!(pipeline_id, "Activating pipeline");
        let response = self.request(Method::POST, &url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Get the definition currently stored for a pipeline
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline to read
    pub async fn get_pipeline_definition(
        &self,
        pipeline_id: &str,
    ) -> Result<PipelineDefinitionOutput> {
        let url = format!("{}/api/pipelines/{}/definition", self.base_url, pipeline_id);
        debug!(pipeline_id, "Reading pipeline definition");
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use pipedef_core::domain::pipeline::{Field, PipelineObject};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn definition() -> PutPipelineDefinition {
        PutPipelineDefinition {
            pipeline_id: "p1".to_string(),
            pipeline_objects: vec![PipelineObject {
                id: "o1".to_string(),
                name: "Default".to_string(),
                fields: vec![Field::string("type", "Default")],
            }],
            parameter_objects: None,
            parameter_values: None,
        }
    }

    #[tokio::test]
    async fn test_put_pipeline_definition() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/pipelines/p1/definition"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(json!({
                "pipelineId": "p1",
                "pipelineObjects": [{
                    "id": "o1",
                    "name": "Default",
                    "fields": [{ "key": "type", "stringValue": "Default" }]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errored": true,
                "validationErrors": [{ "id": "o1", "errors": ["role is not authorized"] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri()).with_token("token");
        let output = client.put_pipeline_definition(&definition()).await.unwrap();

        assert!(output.errored);
        assert_eq!(output.validation_errors[0].id, "o1");
    }

    #[tokio::test]
    async fn test_error_envelope_is_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/pipelines/p1/definition"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "PipelineNotFoundException",
                "message": "pipeline p1 does not exist"
            })))
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri());
        let err = client.get_pipeline_definition("p1").await.unwrap_err();

        assert!(err.is_code(codes::PIPELINE_NOT_FOUND));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("pipeline p1 does not exist"));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/pipelines/p1/activate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri());
        let err = client.activate_pipeline("p1").await.unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn test_activate_and_get() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/pipelines/p1/activate"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/pipelines/p1/definition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pipelineObjects": [{ "id": "o1", "name": "Default" }]
            })))
            .mount(&server)
            .await;

        let client = ManagementClient::new(server.uri());
        client.activate_pipeline("p1").await.unwrap();

        let definition = client.get_pipeline_definition("p1").await.unwrap();
        assert_eq!(definition.pipeline_objects.len(), 1);
        assert!(definition.parameter_objects.is_empty());
    }
}
