//! Task-set waiters.

use converge_api::{EcsApi, StabilityStatus, TaskSet, TaskSetStatus};

use super::{classify_deletion_status, observe, run_wait, WaitOptions};
use crate::domain::{Result, TaskSetHandle};
use crate::waiter::FnRefresh;

/// Wait until the task set reports `STEADY_STATE`.
pub async fn wait_task_set_stable(
    api: &dyn EcsApi,
    handle: &TaskSetHandle,
    options: &WaitOptions,
) -> Result<TaskSet> {
    let conf = options.conf(
        &[StabilityStatus::Stabilizing.as_str()],
        &[StabilityStatus::SteadyState.as_str()],
    )?;

    let mut refresh = FnRefresh(move || async move {
        observe(
            api.describe_task_set(&handle.task_set, &handle.service, &handle.cluster)
                .await,
            |ts| ts.stability_status.as_str().to_string(),
        )
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "task set stable").await
}

/// Wait until the task set is `INACTIVE` or gone. `None` means gone.
pub async fn wait_task_set_deleted(
    api: &dyn EcsApi,
    handle: &TaskSetHandle,
    options: &WaitOptions,
) -> Result<Option<TaskSet>> {
    let conf = options.conf(
        &[
            TaskSetStatus::Active.as_str(),
            TaskSetStatus::Primary.as_str(),
            TaskSetStatus::Draining.as_str(),
        ],
        &[TaskSetStatus::Inactive.as_str()],
    )?;

    let mut refresh = FnRefresh(move || async move {
        classify_deletion_status(
            api.describe_task_set(&handle.task_set, &handle.service, &handle.cluster)
                .await,
            |ts| ts.status.as_str().to_string(),
        )
    });
    run_wait(conf, &mut refresh, &handle.to_string(), "task set deleted").await
}
