//! Error taxonomy for the reconciliation core.

use converge_api::ApiError;

/// Errors returned by normalization, waiters and mutation flows.
///
/// Waiter and flow failures carry the handle and operation they were working
/// on so a caller juggling several resources can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum ConvergeError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid handle {input:?}: {reason}")]
    InvalidHandle { input: String, reason: String },

    #[error("invalid ARN {input:?}: {reason}")]
    InvalidArn { input: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A wait or a retried mutation ran out of time. `last_error` is the
    /// last retryable API failure when a mutation timed out.
    #[error("{operation} of {handle} timed out after {limit_ms}ms (last status: {last_status})")]
    Timeout {
        handle: String,
        operation: String,
        last_status: String,
        limit_ms: u64,
        #[source]
        last_error: Option<ApiError>,
    },

    #[error("{operation} of {handle} reached unexpected status {status}")]
    UnexpectedStatus {
        handle: String,
        operation: String,
        status: String,
    },

    #[error("{operation} of {handle}: resource not found")]
    NotFound { handle: String, operation: String },

    #[error("{operation} of {handle} failed: {source}")]
    Api {
        handle: String,
        operation: String,
        #[source]
        source: ApiError,
    },

    #[error("{operation} of {handle} cancelled")]
    Cancelled { handle: String, operation: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConvergeError {
    /// Whether retrying the same call could change the outcome.
    ///
    /// Parse, handle and configuration errors never can.
    pub fn is_permanent(&self) -> bool {
        match self {
            ConvergeError::Parse(_)
            | ConvergeError::InvalidHandle { .. }
            | ConvergeError::InvalidArn { .. }
            | ConvergeError::InvalidConfig(_)
            | ConvergeError::UnexpectedStatus { .. }
            | ConvergeError::Serialization(_) => true,
            ConvergeError::Timeout { .. }
            | ConvergeError::NotFound { .. }
            | ConvergeError::Api { .. }
            | ConvergeError::Cancelled { .. } => false,
        }
    }

    pub(crate) fn invalid_handle(input: &str, reason: impl Into<String>) -> Self {
        ConvergeError::InvalidHandle {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ConvergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_handle_and_operation() {
        let err = ConvergeError::Timeout {
            handle: "web/api".to_string(),
            operation: "service stable".to_string(),
            last_status: "DEPLOYING".to_string(),
            limit_ms: 1200000,
            last_error: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("web/api"));
        assert!(msg.contains("service stable"));
        assert!(msg.contains("DEPLOYING"));
        assert!(msg.contains("1200000ms"));
    }

    #[test]
    fn test_api_error_is_source() {
        use std::error::Error;

        let err = ConvergeError::Api {
            handle: "web".to_string(),
            operation: "cluster active".to_string(),
            source: ApiError::Throttling {
                message: "slow down".to_string(),
            },
        };
        let source = err.source().unwrap();
        assert!(source.to_string().contains("slow down"));
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_parse_errors_are_permanent() {
        assert!(ConvergeError::Parse("bad json".to_string()).is_permanent());
        assert!(ConvergeError::invalid_handle("a,b", "expected 3 parts").is_permanent());
    }
}
