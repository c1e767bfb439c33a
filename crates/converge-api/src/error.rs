//! Error types for converge-api

use thiserror::Error;

/// Errors surfaced by the control-plane API.
///
/// Variants mirror the exception families the remote service returns so that
/// retry classifiers can match on both the kind and the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The addressed resource does not exist (or no longer exists)
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// The parent cluster does not exist
    #[error("Cluster not found: {cluster}")]
    ClusterNotFound { cluster: String },

    /// The parent service does not exist
    #[error("Service not found: {service}")]
    ServiceNotFound { service: String },

    /// Request rejected as invalid; the message carries the signature
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Caller is not (yet) authorized
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Resource is in use by another operation
    #[error("Resource in use: {message}")]
    ResourceInUse { message: String },

    /// The service is not (or no longer) active
    #[error("Service not active: {message}")]
    ServiceNotActive { message: String },

    /// A previous update is still being applied
    #[error("Update in progress: {message}")]
    UpdateInProgress { message: String },

    /// Request was throttled
    #[error("Throttled: {message}")]
    Throttling { message: String },

    /// Remote side failed
    #[error("Server error: {message}")]
    Server { message: String },

    /// The transport never produced a response
    #[error("Transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Convenience constructor for `InvalidParameter`.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Convenience constructor for `NotFound`.
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether this error means the addressed resource is absent.
    ///
    /// Parent-not-found errors count: a service inside a missing cluster is
    /// itself missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound { .. }
                | ApiError::ClusterNotFound { .. }
                | ApiError::ServiceNotFound { .. }
        )
    }

    /// Whether this is an `InvalidParameter` error whose message contains `needle`.
    pub fn is_invalid_parameter_containing(&self, needle: &str) -> bool {
        matches!(self, ApiError::InvalidParameter { message } if message.contains(needle))
    }

    /// Whether this is an `AccessDenied` error whose message contains `needle`.
    pub fn is_access_denied_containing(&self, needle: &str) -> bool {
        matches!(self, ApiError::AccessDenied { message } if message.contains(needle))
    }

    /// Short machine-readable kind, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::ClusterNotFound { .. } => "cluster_not_found",
            ApiError::ServiceNotFound { .. } => "service_not_found",
            ApiError::InvalidParameter { .. } => "invalid_parameter",
            ApiError::AccessDenied { .. } => "access_denied",
            ApiError::ResourceInUse { .. } => "resource_in_use",
            ApiError::ServiceNotActive { .. } => "service_not_active",
            ApiError::UpdateInProgress { .. } => "update_in_progress",
            ApiError::Throttling { .. } => "throttling",
            ApiError::Server { .. } => "server",
            ApiError::Transport(_) => "transport",
        }
    }
}

/// Result type for control-plane calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;
