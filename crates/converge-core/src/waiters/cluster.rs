//! Cluster waiters.

use converge_api::{Cluster, ClusterStatus, EcsApi};

use super::{classify_deletion_status, observe, run_wait, WaitOptions};
use crate::domain::{ClusterHandle, Result};
use crate::waiter::FnRefresh;

/// Whether the cluster is expected to exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Just created: not-found may be eventual consistency and is tolerated.
    Creating,
    /// Already known to exist: not-found fails the wait at once.
    Existing,
}

/// Wait until the cluster leaves `PROVISIONING` for `ACTIVE`.
pub async fn wait_cluster_active(
    api: &dyn EcsApi,
    handle: &ClusterHandle,
    lifecycle: Lifecycle,
    options: &WaitOptions,
) -> Result<Cluster> {
    let mut conf = options.conf(
        &[ClusterStatus::Provisioning.as_str()],
        &[ClusterStatus::Active.as_str()],
    )?;
    if lifecycle == Lifecycle::Existing {
        conf = conf.with_not_found_checks(0);
    }

    let mut refresh = FnRefresh(move || async move {
        observe(api.describe_cluster(&handle.cluster).await, |c| {
            c.status.as_str().to_string()
        })
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "cluster active").await
}

/// Wait until the cluster is `INACTIVE` or gone. `None` means gone.
pub async fn wait_cluster_deleted(
    api: &dyn EcsApi,
    handle: &ClusterHandle,
    options: &WaitOptions,
) -> Result<Option<Cluster>> {
    let conf = options.conf(
        &[
            ClusterStatus::Active.as_str(),
            ClusterStatus::Deprovisioning.as_str(),
        ],
        &[ClusterStatus::Inactive.as_str()],
    )?;

    let mut refresh = FnRefresh(move || async move {
        classify_deletion_status(api.describe_cluster(&handle.cluster).await, |c| {
            c.status.as_str().to_string()
        })
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "cluster deleted").await
}
