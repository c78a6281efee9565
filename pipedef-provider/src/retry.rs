//! Retry policy and transient-failure classification

use pipedef_core::validation::ValidationErrors;
use std::time::Duration;

/// Exponential backoff bounded by the operation's timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay to wait after `current`, capped at `max_delay`
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(self.multiplier).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

/// Decides whether a validation failure is expected to resolve on its own
pub trait TransientClassifier: Send + Sync {
    fn is_transient_validation(&self, errors: &ValidationErrors) -> bool;
}

/// Treats validation text mentioning a role as an IAM propagation race
///
/// Newly created roles take a while to become visible to the pipeline
/// service, which meanwhile rejects definitions that reference them.
#[derive(Debug, Clone)]
pub struct RoleKeywordClassifier {
    keyword: String,
}

impl RoleKeywordClassifier {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }
}

impl Default for RoleKeywordClassifier {
    fn default() -> Self {
        Self::new("role")
    }
}

impl TransientClassifier for RoleKeywordClassifier {
    fn is_transient_validation(&self, errors: &ValidationErrors) -> bool {
        errors.mentions(&self.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipedef_core::domain::pipeline::ValidationError;

    fn errors(message: &str) -> ValidationErrors {
        ValidationErrors::aggregate(&[ValidationError {
            id: "o1".to_string(),
            errors: vec![message.to_string()],
        }])
        .unwrap()
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(delay.as_millis());
            delay = policy.next_delay(delay);
        }
        assert_eq!(seen, vec![500, 1000, 2000, 4000, 8000, 10000, 10000]);
    }

    #[test]
    fn test_role_keyword_classifier() {
        let classifier = RoleKeywordClassifier::default();
        assert!(classifier.is_transient_validation(&errors("role is not authorized")));
        assert!(!classifier.is_transient_validation(&errors("field 'key' is required")));
    }

    #[test]
    fn test_custom_keyword() {
        let classifier = RoleKeywordClassifier::new("throttled");
        assert!(classifier.is_transient_validation(&errors("request throttled")));
        assert!(!classifier.is_transient_validation(&errors("role is not authorized")));
    }
}
