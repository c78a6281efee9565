//! Configuration module
//!
//! Connection and timeout flags, each falling back to the same environment
//! variable the provider configuration reads.

use clap::Args;
use pipedef_provider::Config;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Management API URL
    #[arg(long, env = "PIPEDEF_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    /// Bearer token for the management API
    #[arg(long, env = "PIPEDEF_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Create timeout in seconds, also used when updating
    #[arg(long, env = "PIPEDEF_CREATE_TIMEOUT", default_value_t = 1200)]
    create_timeout: u64,

    /// Read timeout in seconds
    #[arg(long, env = "PIPEDEF_READ_TIMEOUT", default_value_t = 300)]
    read_timeout: u64,

    /// Delete timeout in seconds
    #[arg(long, env = "PIPEDEF_DELETE_TIMEOUT", default_value_t = 300)]
    delete_timeout: u64,

    /// First retry delay in milliseconds
    #[arg(long, env = "PIPEDEF_RETRY_INITIAL_DELAY_MS", default_value_t = 500)]
    retry_initial_delay_ms: u64,

    /// Longest retry delay in milliseconds
    #[arg(long, env = "PIPEDEF_RETRY_MAX_DELAY_MS", default_value_t = 10_000)]
    retry_max_delay_ms: u64,
}

impl ConnectionArgs {
    pub fn into_config(self) -> Config {
        let mut config = Config::new(self.endpoint);
        if let Some(token) = self.api_token.filter(|t| !t.is_empty()) {
            config = config.with_api_token(token);
        }

        let create = Duration::from_secs(self.create_timeout);
        config.timeouts.create = create;
        config.timeouts.update = create;
        config.timeouts.read = Duration::from_secs(self.read_timeout);
        config.timeouts.delete = Duration::from_secs(self.delete_timeout);

        config.retry.initial_delay = Duration::from_millis(self.retry_initial_delay_ms);
        config.retry.max_delay = Duration::from_millis(self.retry_max_delay_ms);
        config
    }
}
