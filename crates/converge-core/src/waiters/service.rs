//! Service waiters.
//!
//! Stability is not a status the control plane reports. It is derived from
//! the service and its `PRIMARY` deployment on every tick.

use converge_api::{EcsApi, RolloutState, Service, ServiceStatus};

use super::{classify_deletion_status, observe, run_wait, WaitOptions};
use crate::domain::{Result, ServiceHandle};
use crate::waiter::{FnRefresh, Observation};

/// Synthetic status: the service can be described.
pub const STATUS_FOUND: &str = "FOUND";
/// Synthetic status: a rollout is still under way.
pub const STATUS_DEPLOYING: &str = "DEPLOYING";
/// Synthetic status: the primary deployment has completed.
pub const STATUS_STABLE: &str = "STABLE";

/// Derive the stability status of a service.
///
/// A service that is not `ACTIVE` reports its own status. Otherwise the
/// `PRIMARY` deployment decides: `COMPLETED` with no other deployment left is
/// stable, `FAILED` is reported as is, anything else is still deploying.
/// Deployments without a rollout state count as stable once they are the
/// only deployment and all desired tasks run.
pub fn service_stability_status(service: &Service) -> String {
    if service.status != ServiceStatus::Active {
        return service.status.as_str().to_string();
    }
    let Some(primary) = service.primary_deployment() else {
        return STATUS_DEPLOYING.to_string();
    };
    let single = service.deployments.len() == 1;
    let status = match primary.rollout_state {
        Some(RolloutState::Completed) if single => STATUS_STABLE,
        Some(RolloutState::Completed) => STATUS_DEPLOYING,
        Some(RolloutState::Failed) => RolloutState::Failed.as_str(),
        Some(RolloutState::InProgress) => STATUS_DEPLOYING,
        None if single && service.running_count == service.desired_count => STATUS_STABLE,
        None => STATUS_DEPLOYING,
    };
    status.to_string()
}

/// Wait until the service can be described.
///
/// An `INACTIVE` service is a deleted one and counts as not found.
pub async fn wait_service_active(
    api: &dyn EcsApi,
    handle: &ServiceHandle,
    options: &WaitOptions,
) -> Result<Service> {
    let conf = options.conf(&[], &[STATUS_FOUND])?;

    let mut refresh = FnRefresh(move || async move {
        let observed = observe(
            api.describe_service(&handle.service, &handle.cluster).await,
            |_| STATUS_FOUND.to_string(),
        )?;
        Ok(match observed {
            Observation::Found { object, .. } if object.status == ServiceStatus::Inactive => {
                Observation::Missing
            }
            other => other,
        })
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "service active").await
}

/// Wait until the service's primary deployment has rolled out.
///
/// A failed rollout fails the wait with `UnexpectedStatus("FAILED")`.
pub async fn wait_service_stable(
    api: &dyn EcsApi,
    handle: &ServiceHandle,
    options: &WaitOptions,
) -> Result<Service> {
    let conf = options.conf(&[STATUS_DEPLOYING], &[STATUS_STABLE])?;

    let mut refresh = FnRefresh(move || async move {
        observe(
            api.describe_service(&handle.service, &handle.cluster).await,
            service_stability_status,
        )
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "service stable").await
}

/// Wait until the service is `INACTIVE` or gone. `None` means gone.
pub async fn wait_service_inactive(
    api: &dyn EcsApi,
    handle: &ServiceHandle,
    options: &WaitOptions,
) -> Result<Option<Service>> {
    let conf = options.conf(
        &[ServiceStatus::Active.as_str(), ServiceStatus::Draining.as_str()],
        &[ServiceStatus::Inactive.as_str()],
    )?;

    let mut refresh = FnRefresh(move || async move {
        classify_deletion_status(
            api.describe_service(&handle.service, &handle.cluster).await,
            |s| s.status.as_str().to_string(),
        )
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "service inactive").await
}

#[cfg(test)]
mod tests {
    use converge_api::{Deployment, DeploymentStatus};

    use super::*;

    fn deployment(status: DeploymentStatus, rollout: Option<RolloutState>) -> Deployment {
        Deployment {
            id: "ecs-svc/1".to_string(),
            status,
            rollout_state: rollout,
            desired_count: 2,
            running_count: 2,
            created_at: None,
        }
    }

    fn service(deployments: Vec<Deployment>) -> Service {
        Service {
            service_arn: "arn:aws:ecs:us-east-1:000000000000:service/prod/web".to_string(),
            service_name: "web".to_string(),
            cluster_arn: "arn:aws:ecs:us-east-1:000000000000:cluster/prod".to_string(),
            status: ServiceStatus::Active,
            desired_count: 2,
            running_count: 2,
            task_definition: None,
            deployments,
        }
    }

    #[test]
    fn test_completed_single_deployment_is_stable() {
        let s = service(vec![deployment(
            DeploymentStatus::Primary,
            Some(RolloutState::Completed),
        )]);
        assert_eq!(service_stability_status(&s), STATUS_STABLE);
    }

    #[test]
    fn test_old_deployment_still_draining() {
        let s = service(vec![
            deployment(DeploymentStatus::Primary, Some(RolloutState::Completed)),
            deployment(DeploymentStatus::Active, Some(RolloutState::Completed)),
        ]);
        assert_eq!(service_stability_status(&s), STATUS_DEPLOYING);
    }

    #[test]
    fn test_failed_rollout_reported() {
        let s = service(vec![deployment(
            DeploymentStatus::Primary,
            Some(RolloutState::Failed),
        )]);
        assert_eq!(service_stability_status(&s), "FAILED");
    }

    #[test]
    fn test_no_rollout_state_uses_counts() {
        let mut s = service(vec![deployment(DeploymentStatus::Primary, None)]);
        assert_eq!(service_stability_status(&s), STATUS_STABLE);
        s.running_count = 1;
        assert_eq!(service_stability_status(&s), STATUS_DEPLOYING);
    }

    #[test]
    fn test_draining_service_reports_own_status() {
        let mut s = service(vec![]);
        s.status = ServiceStatus::Draining;
        assert_eq!(service_stability_status(&s), "DRAINING");
    }
}
