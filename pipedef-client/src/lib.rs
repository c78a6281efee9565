//! Pipedef HTTP Client
//!
//! A simple, type-safe HTTP client for the pipeline management API.
//!
//! The provider drives every remote call through this client: submitting and
//! activating pipeline definitions, reading them back, and managing the
//! organization resource policy.
//!
//! # Example
//!
//! ```no_run
//! use pipedef_client::ManagementClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ManagementClient::new("http://localhost:8080");
//!
//!     let definition = client.get_pipeline_definition("df-0123").await?;
//!     println!("{} object(s)", definition.pipeline_objects.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod pipelines;
mod policies;

// Re-export commonly used types
pub use error::{ClientError, Result, codes};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::ErrorEnvelope;

/// HTTP client for the management API
///
/// Methods are organized into logical groups:
/// - Pipeline definitions (put, activate, get)
/// - Organization resource policy (describe, put, delete)
#[derive(Debug, Clone)]
pub struct ManagementClient {
    /// Base URL of the management API (e.g., "http://localhost:8080")
    base_url: String,
    /// Bearer credential sent with every request
    api_token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ManagementClient {
    /// Create a new management client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the management API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use pipedef_client::ManagementClient;
    ///
    /// let client = ManagementClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new management client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use pipedef_client::ManagementClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ManagementClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            client,
        }
    }

    /// Attach a bearer credential to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Get the base URL of the management API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            return Err(Self::error_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(())
    }

    /// Builds a `ClientError` from a failed response, reading the error envelope when present
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::ApiError {
                status,
                code: envelope.code,
                message: envelope.message.unwrap_or(body),
            },
            Err(_) => ClientError::api_error(status, body),
        }
    }
}
