//! Which mutation failures are worth retrying.
//!
//! Each profile recognises the errors the control plane returns while a
//! dependency it just created is still propagating: a cluster that is not
//! visible yet, a role that cannot be assumed yet, a load balancer that is
//! not attached yet. Everything else is permanent.

use converge_api::ApiError;
use serde::{Deserialize, Serialize};

/// Outcome of classifying a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Fail,
}

const SERVICE_ROLE_PERMISSIONS: &str =
    "verify that the ECS service role being passed has the proper permissions";
const NO_ASSOCIATED_LOAD_BALANCER: &str = "does not have an associated load balancer";
const SERVICE_LINKED_ROLE: &str = "Unable to assume the service linked role";
const DEPLOYMENTS_ACTIVE: &str = "The service cannot be stopped while deployments are active.";
const DEPENDENT_OBJECT: &str = "has a dependent object";

const IAM_PROPAGATION_MESSAGES: &[&str] = &[
    "Unable to assume role",
    SERVICE_LINKED_ROLE,
    "is not authorized to perform: sts:AssumeRole",
    "The security token included in the request is invalid",
    "role is not yet available",
];

/// Retry classifier per kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryProfile {
    ServiceCreate,
    ServiceUpdate,
    ServiceDelete,
    ClusterMutation,
    TaskSetCreate,
    IamPropagation,
    GatewayService,
    GatewayServiceDelete,
}

impl RetryProfile {
    pub fn name(&self) -> &'static str {
        match self {
            RetryProfile::ServiceCreate => "service_create",
            RetryProfile::ServiceUpdate => "service_update",
            RetryProfile::ServiceDelete => "service_delete",
            RetryProfile::ClusterMutation => "cluster_mutation",
            RetryProfile::TaskSetCreate => "task_set_create",
            RetryProfile::IamPropagation => "iam_propagation",
            RetryProfile::GatewayService => "gateway_service",
            RetryProfile::GatewayServiceDelete => "gateway_service_delete",
        }
    }

    pub fn classify(&self, err: &ApiError) -> RetryDecision {
        let retry = match self {
            RetryProfile::ServiceCreate => {
                matches!(err, ApiError::ClusterNotFound { .. })
                    || err.is_invalid_parameter_containing(SERVICE_ROLE_PERMISSIONS)
                    || err.is_invalid_parameter_containing(NO_ASSOCIATED_LOAD_BALANCER)
                    || err.is_invalid_parameter_containing(SERVICE_LINKED_ROLE)
            }
            RetryProfile::ServiceUpdate => {
                err.is_invalid_parameter_containing(SERVICE_ROLE_PERMISSIONS)
                    || err.is_invalid_parameter_containing(NO_ASSOCIATED_LOAD_BALANCER)
            }
            RetryProfile::ServiceDelete => {
                err.is_invalid_parameter_containing(DEPLOYMENTS_ACTIVE)
                    || err.is_invalid_parameter_containing(DEPENDENT_OBJECT)
            }
            RetryProfile::ClusterMutation => {
                matches!(
                    err,
                    ApiError::UpdateInProgress { .. } | ApiError::ResourceInUse { .. }
                ) || err.is_invalid_parameter_containing(SERVICE_LINKED_ROLE)
            }
            RetryProfile::TaskSetCreate => {
                matches!(
                    err,
                    ApiError::ClusterNotFound { .. } | ApiError::ServiceNotFound { .. }
                ) || err.is_invalid_parameter_containing(NO_ASSOCIATED_LOAD_BALANCER)
            }
            RetryProfile::IamPropagation => IAM_PROPAGATION_MESSAGES.iter().any(|needle| {
                err.is_invalid_parameter_containing(needle)
                    || err.is_access_denied_containing(needle)
            }),
            RetryProfile::GatewayService => false,
            RetryProfile::GatewayServiceDelete => matches!(
                err,
                ApiError::InvalidParameter { .. } | ApiError::ServiceNotActive { .. }
            ),
        };
        if retry {
            RetryDecision::Retry
        } else {
            RetryDecision::Fail
        }
    }
}
