//! converge-api: control-plane boundary for ECS Converge
//!
//! This crate defines what the reconciliation core consumes from the
//! container-orchestration control plane, without binding to any transport.
//!
//! ## Key Components
//!
//! - `EcsApi`: read-only describe/list calls per resource kind
//! - `model`: typed views of clusters, services, task sets, gateway services
//!   and service deployments
//! - `ApiError`: error taxonomy with kind + message for retry classifiers
//! - `fakes::ScriptedEcsApi`: scripted in-memory fake for tests

pub mod api_traits;
mod error;
pub mod fakes;
pub mod model;

pub use api_traits::EcsApi;
pub use error::{ApiError, ApiResult};
pub use model::{
    Cluster, ClusterStatus, Deployment, DeploymentStatus, GatewayService, GatewayServiceStatus,
    GatewayStatusCode, RolloutState, Service, ServiceDeployment, ServiceDeploymentBrief,
    ServiceDeploymentStatus, ServiceStatus, StabilityStatus, TaskSet, TaskSetStatus,
};
