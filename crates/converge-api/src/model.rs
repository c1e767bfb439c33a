//! Remote object model
//!
//! Typed views of the objects the control plane returns from its describe and
//! list calls. Only the fields the reconciliation layer reads are modelled.
//! Status enums serialize to the wire spelling (`ACTIVE`, `STEADY_STATE`, ...)
//! and expose it through `as_str()` so waiters can compare status strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declares a wire-level status enum with `as_str()` and `Display`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Wire spelling of this status.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

wire_enum! {
    /// Lifecycle status of a cluster.
    ClusterStatus {
        Provisioning => "PROVISIONING",
        Active => "ACTIVE",
        Deprovisioning => "DEPROVISIONING",
        Failed => "FAILED",
        Inactive => "INACTIVE",
    }
}

/// A cluster as returned by `describe_cluster`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_arn: String,
    pub cluster_name: String,
    pub status: ClusterStatus,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

wire_enum! {
    /// Top-level status of a service.
    ServiceStatus {
        Active => "ACTIVE",
        Draining => "DRAINING",
        Inactive => "INACTIVE",
    }
}

wire_enum! {
    /// Role of a deployment inside its service.
    DeploymentStatus {
        Primary => "PRIMARY",
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

wire_enum! {
    /// Rollout progress of a single deployment.
    RolloutState {
        Completed => "COMPLETED",
        Failed => "FAILED",
        InProgress => "IN_PROGRESS",
    }
}

/// One deployment (rollout) of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub status: DeploymentStatus,
    pub rollout_state: Option<RolloutState>,
    pub desired_count: i32,
    pub running_count: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// A service as returned by `describe_service`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_arn: String,
    pub service_name: String,
    pub cluster_arn: String,
    pub status: ServiceStatus,
    pub desired_count: i32,
    pub running_count: i32,
    pub task_definition: Option<String>,
    pub deployments: Vec<Deployment>,
}

impl Service {
    /// The deployment currently marked `PRIMARY`, if any.
    pub fn primary_deployment(&self) -> Option<&Deployment> {
        self.deployments
            .iter()
            .find(|d| d.status == DeploymentStatus::Primary)
    }
}

// ---------------------------------------------------------------------------
// Task set
// ---------------------------------------------------------------------------

wire_enum! {
    /// Status of a task set within its service.
    TaskSetStatus {
        Primary => "PRIMARY",
        Active => "ACTIVE",
        Draining => "DRAINING",
        Inactive => "INACTIVE",
    }
}

wire_enum! {
    /// Whether a task set has reached its steady state.
    StabilityStatus {
        SteadyState => "STEADY_STATE",
        Stabilizing => "STABILIZING",
    }
}

/// A task set as returned by `describe_task_set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSet {
    pub id: String,
    pub task_set_arn: String,
    pub service_arn: String,
    pub cluster_arn: String,
    pub status: TaskSetStatus,
    pub stability_status: StabilityStatus,
}

// ---------------------------------------------------------------------------
// Gateway service and service deployments
// ---------------------------------------------------------------------------

wire_enum! {
    /// Status code of a gateway service.
    GatewayStatusCode {
        Active => "ACTIVE",
        Draining => "DRAINING",
        Inactive => "INACTIVE",
    }
}

/// Status block of a gateway service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayServiceStatus {
    pub status_code: GatewayStatusCode,
    pub status_reason: Option<String>,
}

/// A gateway service as returned by `describe_gateway_service`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayService {
    pub service_arn: String,
    pub service_name: String,
    pub cluster: String,
    pub status: GatewayServiceStatus,
    /// ARN of the deployment the service is currently converging to.
    pub current_deployment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

wire_enum! {
    /// Status of a service deployment.
    ServiceDeploymentStatus {
        Pending => "PENDING",
        Successful => "SUCCESSFUL",
        Stopped => "STOPPED",
        StopRequested => "STOP_REQUESTED",
        InProgress => "IN_PROGRESS",
        RollbackRequested => "ROLLBACK_REQUESTED",
        RollbackInProgress => "ROLLBACK_IN_PROGRESS",
        RollbackSuccessful => "ROLLBACK_SUCCESSFUL",
        RollbackFailed => "ROLLBACK_FAILED",
    }
}

/// Entry returned by `list_service_deployments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDeploymentBrief {
    pub service_deployment_arn: String,
    pub status: ServiceDeploymentStatus,
    pub created_at: DateTime<Utc>,
}

/// A service deployment as returned by `describe_service_deployment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDeployment {
    pub service_deployment_arn: String,
    pub service_arn: String,
    pub cluster_arn: String,
    pub status: ServiceDeploymentStatus,
    pub created_at: DateTime<Utc>,
}
