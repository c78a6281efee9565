//! Provider configuration
//!
//! Defines the management API connection settings, per-operation timeouts
//! and the retry backoff used while a submitted definition settles.

use pipedef_client::ManagementClient;
use std::time::Duration;

use crate::context::ResourceTimeouts;
use crate::retry::RetryPolicy;

/// Provider configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Management API base URL (e.g., "http://localhost:8080")
    pub endpoint: String,

    /// Bearer credential for the management API
    pub api_token: Option<String>,

    pub timeouts: ResourceTimeouts,

    pub retry: RetryPolicy,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            api_token: None,
            timeouts: ResourceTimeouts::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - PIPEDEF_ENDPOINT (required)
    /// - PIPEDEF_API_TOKEN (optional)
    /// - PIPEDEF_CREATE_TIMEOUT (optional, seconds, default: 1200; also used by update)
    /// - PIPEDEF_READ_TIMEOUT (optional, seconds, default: 300)
    /// - PIPEDEF_DELETE_TIMEOUT (optional, seconds, default: 300)
    /// - PIPEDEF_RETRY_INITIAL_DELAY_MS (optional, default: 500)
    /// - PIPEDEF_RETRY_MAX_DELAY_MS (optional, default: 10000)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let endpoint = lookup("PIPEDEF_ENDPOINT")
            .ok_or_else(|| anyhow::anyhow!("PIPEDEF_ENDPOINT environment variable not set"))?;

        let mut config = Self::new(endpoint);
        config.api_token = lookup("PIPEDEF_API_TOKEN").filter(|token| !token.is_empty());

        let seconds = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let create = seconds("PIPEDEF_CREATE_TIMEOUT", config.timeouts.create);
        config.timeouts = ResourceTimeouts {
            create,
            read: seconds("PIPEDEF_READ_TIMEOUT", config.timeouts.read),
            update: create,
            delete: seconds("PIPEDEF_DELETE_TIMEOUT", config.timeouts.delete),
        };

        config.retry.initial_delay =
            millis("PIPEDEF_RETRY_INITIAL_DELAY_MS", config.retry.initial_delay);
        config.retry.max_delay = millis("PIPEDEF_RETRY_MAX_DELAY_MS", config.retry.max_delay);

        Ok(config)
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.is_empty() {
            anyhow::bail!("endpoint cannot be empty");
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            anyhow::bail!("endpoint must start with http:// or https://");
        }

        let timeouts = [
            ("create", self.timeouts.create),
            ("read", self.timeouts.read),
            ("update", self.timeouts.update),
            ("delete", self.timeouts.delete),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                anyhow::bail!("{} timeout must be greater than 0", name);
            }
        }

        if self.retry.initial_delay.is_zero() {
            anyhow::bail!("retry initial delay must be greater than 0");
        }

        if self.retry.max_delay < self.retry.initial_delay {
            anyhow::bail!("retry max delay cannot be shorter than the initial delay");
        }

        Ok(())
    }

    /// Builds the management API client for this configuration
    pub fn client(&self) -> ManagementClient {
        let client = ManagementClient::new(self.endpoint.clone());
        match &self.api_token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeouts.create, Duration::from_secs(1200));
        assert_eq!(config.timeouts.read, Duration::from_secs(300));
        assert_eq!(config.retry.initial_delay, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("PIPEDEF_ENDPOINT", "https://pipelines.internal"),
            ("PIPEDEF_API_TOKEN", "secret"),
            ("PIPEDEF_CREATE_TIMEOUT", "60"),
            ("PIPEDEF_RETRY_MAX_DELAY_MS", "2000"),
            ("PIPEDEF_READ_TIMEOUT", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "https://pipelines.internal");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.timeouts.create, Duration::from_secs(60));
        assert_eq!(config.timeouts.update, Duration::from_secs(60));
        assert_eq!(config.timeouts.read, Duration::from_secs(300));
        assert_eq!(config.retry.max_delay, Duration::from_millis(2000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.endpoint = "not-a-url".to_string();
        assert!(config.validate().is_err());
        config.endpoint = "http://localhost:8080".to_string();

        config.timeouts.read = Duration::ZERO;
        assert!(config.validate().is_err());
        config.timeouts.read = Duration::from_secs(1);

        config.retry.max_delay = Duration::from_millis(100);
        assert!(config.validate().is_err());
        config.retry.max_delay = Duration::from_secs(10);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_uses_endpoint() {
        let config = Config::default().with_api_token("secret");
        assert_eq!(config.client().base_url(), "http://localhost:8080");
    }
}
