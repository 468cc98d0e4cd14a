//! Unified error handling
//!
//! Structured error types with context and proper error chaining.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type RepolensResult<T> = Result<T, RepolensError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where the error originated
    pub component: String,
    /// Operation being performed when the error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the repolens system
#[derive(Error, Debug)]
pub enum RepolensError {
    #[error("{message}")]
    RateLimit {
        message: String,
        /// Estimated minutes until the upstream quota resets
        wait_minutes: f64,
        context: ErrorContext,
    },

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepolensError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RepolensError::RateLimit { context, .. } => Some(context),
            RepolensError::Upstream { context, .. } => Some(context),
            RepolensError::NotFound { context, .. } => Some(context),
            RepolensError::Config { context, .. } => Some(context),
            RepolensError::Serialization(_) => None,
        }
    }

    /// Check if the error is recoverable by waiting and retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            RepolensError::RateLimit { .. } => true,
            RepolensError::Upstream { .. } => true,
            RepolensError::NotFound { .. } => false,
            RepolensError::Config { .. } => false,
            RepolensError::Serialization(_) => false,
        }
    }

    /// Log the error at a level matching its severity
    pub fn log(&self) {
        match self {
            RepolensError::RateLimit { wait_minutes, .. } => {
                warn!(wait_minutes, error = %self, "Rate limited by upstream");
            }
            RepolensError::NotFound { .. } => {
                warn!(error = %self, "Resource not found");
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macro for creating upstream errors with context
#[macro_export]
macro_rules! upstream_error {
    ($msg:expr, $component:expr) => {
        $crate::RepolensError::Upstream {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RepolensError::Upstream {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("github_client")
            .with_operation("fetch_repository")
            .with_suggestion("Check the repository name");

        assert_eq!(context.component, "github_client");
        assert_eq!(context.operation.as_deref(), Some("fetch_repository"));
        assert_eq!(context.recovery_suggestions.len(), 1);
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn test_rate_limit_display_uses_message_verbatim() {
        let err = RepolensError::RateLimit {
            message: "GitHub API rate limit exceeded. Please try again in 12.5 minutes."
                .to_string(),
            wait_minutes: 12.5,
            context: ErrorContext::new("github_client"),
        };

        assert_eq!(
            err.to_string(),
            "GitHub API rate limit exceeded. Please try again in 12.5 minutes."
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_not_found_is_not_recoverable() {
        let err = RepolensError::NotFound {
            resource: "repos/acme/missing".to_string(),
            context: ErrorContext::new("github_client"),
        };

        assert_eq!(err.to_string(), "Resource not found: repos/acme/missing");
        assert!(!err.is_recoverable());
    }
}
