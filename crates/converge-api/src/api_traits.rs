//! Control-plane trait definitions
//!
//! `EcsApi` is the read-only surface the reconciliation core consumes:
//! describe calls per resource kind plus the deployment listing used by the
//! gateway-service stability check. Mutating calls are not part of the trait;
//! callers hand them to the retry wrapper as closures.
//!
//! Implementations must be stateless from the caller's point of view and safe
//! to share between concurrent waiters. An in-memory fake lives in `fakes`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ApiResult;
use crate::model::{
    Cluster, GatewayService, Service, ServiceDeployment, ServiceDeploymentBrief, TaskSet,
};

/// Read-only control-plane API.
///
/// Every call returns `ApiError::NotFound` (or a parent-not-found variant)
/// when the addressed resource is absent, so deletion waiters can tell
/// "gone" apart from "failing".
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// Describe a cluster by name or ARN.
    async fn describe_cluster(&self, cluster: &str) -> ApiResult<Cluster>;

    /// Describe a service by name or ARN within a cluster.
    async fn describe_service(&self, service: &str, cluster: &str) -> ApiResult<Service>;

    /// Describe a task set of a service.
    async fn describe_task_set(
        &self,
        task_set: &str,
        service: &str,
        cluster: &str,
    ) -> ApiResult<TaskSet>;

    /// Describe a gateway service by ARN.
    async fn describe_gateway_service(&self, service_arn: &str) -> ApiResult<GatewayService>;

    /// List deployments of a service, optionally only those created after
    /// `created_after`. Order is not guaranteed.
    async fn list_service_deployments(
        &self,
        service: &str,
        cluster: &str,
        created_after: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<ServiceDeploymentBrief>>;

    /// Describe a single service deployment by ARN.
    async fn describe_service_deployment(
        &self,
        deployment_arn: &str,
    ) -> ApiResult<ServiceDeployment>;
}
