//! Gateway-service waiters.
//!
//! Stability of a gateway service is the status of the deployment it is
//! converging to, so the stable waiter's refresher looks one level deeper:
//! it finds that deployment once, caches its ARN and describes it on every
//! later tick.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use converge_api::{
    ApiError, ApiResult, EcsApi, GatewayService, GatewayStatusCode, ServiceDeploymentStatus,
};
use tracing::debug;

use super::{classify_deletion_status, observe, run_wait, WaitOptions};
use crate::domain::{GatewayServiceHandle, Result};
use crate::waiter::{FnRefresh, Observation, Refresh};

/// Synthetic status: the deployment of interest has not settled yet.
pub const STATUS_PENDING: &str = "PENDING";
/// Synthetic status: the deployment of interest succeeded.
pub const STATUS_STABLE: &str = "STABLE";

const INACTIVE_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Describe a gateway service, folding the "Resource not found" flavour of
/// `InvalidParameter` into `NotFound`.
async fn describe(api: &dyn EcsApi, service_arn: &str) -> ApiResult<GatewayService> {
    api.describe_gateway_service(service_arn)
        .await
        .map_err(|e| {
            if e.is_invalid_parameter_containing("Resource not found") {
                ApiError::not_found(service_arn)
            } else {
                e
            }
        })
}

/// Tick status for a deployment status.
pub fn deployment_tick_status(status: ServiceDeploymentStatus) -> String {
    match status {
        ServiceDeploymentStatus::Successful => STATUS_STABLE.to_string(),
        ServiceDeploymentStatus::Pending
        | ServiceDeploymentStatus::InProgress
        | ServiceDeploymentStatus::RollbackRequested
        | ServiceDeploymentStatus::RollbackInProgress => STATUS_PENDING.to_string(),
        other => other.as_str().to_string(),
    }
}

/// Refresher for [`wait_gateway_service_stable`].
pub struct GatewayStableRefresh<'a> {
    api: &'a dyn EcsApi,
    handle: &'a GatewayServiceHandle,
    operation_time: DateTime<Utc>,
    deployment_arn: Option<String>,
}

impl<'a> GatewayStableRefresh<'a> {
    pub fn new(
        api: &'a dyn EcsApi,
        handle: &'a GatewayServiceHandle,
        operation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            handle,
            operation_time,
            deployment_arn: None,
        }
    }

    /// The deployment being tracked, once discovered.
    pub fn deployment_arn(&self) -> Option<&str> {
        self.deployment_arn.as_deref()
    }

    /// The service's current deployment, else the newest one created after
    /// the operation time.
    async fn discover(&self, service: &GatewayService) -> ApiResult<Option<String>> {
        if let Some(current) = &service.current_deployment {
            return Ok(Some(current.clone()));
        }
        let cluster = if self.handle.cluster.is_empty() {
            service.cluster.as_str()
        } else {
            self.handle.cluster.as_str()
        };
        let deployments = self
            .api
            .list_service_deployments(&service.service_name, cluster, Some(self.operation_time))
            .await?;
        Ok(deployments
            .into_iter()
            .filter(|d| d.created_at > self.operation_time)
            .max_by_key(|d| d.created_at)
            .map(|d| d.service_deployment_arn))
    }
}

#[async_trait]
impl Refresh for GatewayStableRefresh<'_> {
    type Object = GatewayService;

    async fn refresh(&mut self) -> ApiResult<Observation<GatewayService>> {
        let service = match describe(self.api, &self.handle.service_arn).await {
            Ok(service) => service,
            Err(e) if e.is_not_found() => return Ok(Observation::Missing),
            Err(e) => return Err(e),
        };

        if service.status.status_code != GatewayStatusCode::Active {
            let status = service.status.status_code.as_str();
            return Ok(Observation::found(service, status));
        }

        if self.deployment_arn.is_none() {
            self.deployment_arn = self.discover(&service).await?;
            if let Some(arn) = &self.deployment_arn {
                debug!(deployment_arn = %arn, "tracking gateway service deployment");
            }
        }

        match &self.deployment_arn {
            Some(arn) => {
                let deployment = self.api.describe_service_deployment(arn).await?;
                Ok(Observation::found(
                    service,
                    deployment_tick_status(deployment.status),
                ))
            }
            None => Ok(Observation::found(service, STATUS_PENDING)),
        }
    }
}

/// Wait until the gateway service is `ACTIVE`.
pub async fn wait_gateway_service_active(
    api: &dyn EcsApi,
    handle: &GatewayServiceHandle,
    options: &WaitOptions,
) -> Result<GatewayService> {
    let conf = options.conf(
        &[
            GatewayStatusCode::Inactive.as_str(),
            GatewayStatusCode::Draining.as_str(),
        ],
        &[GatewayStatusCode::Active.as_str()],
    )?;

    let mut refresh = FnRefresh(move || async move {
        observe(describe(api, &handle.service_arn).await, |s| {
            s.status.status_code.as_str().to_string()
        })
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "gateway service active").await
}

/// Wait until the deployment started by a mutation at `operation_time` has
/// succeeded.
pub async fn wait_gateway_service_stable(
    api: &dyn EcsApi,
    handle: &GatewayServiceHandle,
    operation_time: DateTime<Utc>,
    options: &WaitOptions,
) -> Result<GatewayService> {
    let conf = options.conf(
        &[
            GatewayStatusCode::Inactive.as_str(),
            GatewayStatusCode::Draining.as_str(),
            STATUS_PENDING,
        ],
        &[GatewayStatusCode::Active.as_str(), STATUS_STABLE],
    )?;

    let mut refresh = GatewayStableRefresh::new(api, handle, operation_time);
    run_wait(conf, &mut refresh, &handle.to_string(), "gateway service stable").await
}

/// Wait until the gateway service is `INACTIVE`, `DRAINING` or gone.
/// `None` means gone.
pub async fn wait_gateway_service_inactive(
    api: &dyn EcsApi,
    handle: &GatewayServiceHandle,
    options: &WaitOptions,
) -> Result<Option<GatewayService>> {
    let conf = options
        .conf(
            &[GatewayStatusCode::Active.as_str()],
            &[
                GatewayStatusCode::Inactive.as_str(),
                GatewayStatusCode::Draining.as_str(),
            ],
        )?
        .with_min_timeout(options.min_interval.max(INACTIVE_MIN_INTERVAL));

    let mut refresh = FnRefresh(move || async move {
        classify_deletion_status(describe(api, &handle.service_arn).await, |s| {
            s.status.status_code.as_str().to_string()
        })
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "gateway service inactive").await
}
