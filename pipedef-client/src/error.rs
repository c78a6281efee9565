//! Error types for the management API client

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error codes the management API reports in its error envelope
pub mod codes {
    pub const INTERNAL_SERVICE_ERROR: &str = "InternalServiceError";
    pub const INVALID_REQUEST: &str = "InvalidRequestException";
    pub const PIPELINE_NOT_FOUND: &str = "PipelineNotFoundException";
    pub const PIPELINE_DELETED: &str = "PipelineDeletedException";
    pub const RESOURCE_POLICY_NOT_FOUND: &str = "ResourcePolicyNotFoundException";
}

/// Errors that can occur when using the management client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}, code {}): {message}", .code.as_deref().unwrap_or("unknown"))]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Vendor error code, when the body carried one
        code: Option<String>,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Error body returned by the management API
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ClientError {
    /// Create an API error without a vendor code
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Create an API error carrying a vendor error code
    pub fn coded(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// The vendor error code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ApiError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Check if this error carries the given vendor code
    pub fn is_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
            || self.code().is_some_and(|c| c.ends_with("NotFoundException"))
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
