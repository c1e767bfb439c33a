//! Resource-specific waiters.
//!
//! Each waiter instantiates the poller with its resource's pending and target
//! vocabulary and refresh call, and reports failures as `ConvergeError`s that
//! name the handle and operation.
//!
//! - [`cluster`]: active, deleted
//! - [`service`]: active, stable, inactive
//! - [`task_set`]: stable, deleted
//! - [`gateway_service`]: active, stable (nested deployment lookup), inactive
//! - [`deletion`]: shared "not found means deleted" classification

pub mod cluster;
pub mod deletion;
pub mod gateway_service;
pub mod service;
pub mod task_set;

pub use cluster::{wait_cluster_active, wait_cluster_deleted, Lifecycle};
pub use deletion::{classify_deletion_status, STATUS_INACTIVE};
pub use gateway_service::{
    wait_gateway_service_active, wait_gateway_service_inactive, wait_gateway_service_stable,
    GatewayStableRefresh,
};
pub use service::{
    service_stability_status, wait_service_active, wait_service_inactive, wait_service_stable,
};
pub use task_set::{wait_task_set_deleted, wait_task_set_stable};

use std::fmt::Debug;
use std::time::Duration;

use converge_api::ApiResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::domain::{ConvergeError, Result};
use crate::obs::WaitSpan;
use crate::waiter::{Observation, Refresh, StateChangeConf, WaitError};

/// How long and how often a waiter polls.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub min_interval: Duration,
    pub poll_interval: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl WaitOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            min_interval: Duration::ZERO,
            poll_interval: None,
            cancel: None,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn conf(&self, pending: &[&str], target: &[&str]) -> Result<StateChangeConf> {
        Ok(StateChangeConf::new(pending, target, self.timeout)?
            .with_min_timeout(self.min_interval)
            .with_poll_interval(self.poll_interval)
            .with_cancel(self.cancel.clone()))
    }
}

/// Map a describe result to an observation; not-found is `Missing`.
pub(crate) fn observe<T>(
    result: ApiResult<T>,
    status_of: impl FnOnce(&T) -> String,
) -> ApiResult<Observation<T>> {
    match result {
        Ok(object) => {
            let status = status_of(&object);
            Ok(Observation::Found { object, status })
        }
        Err(e) if e.is_not_found() => Ok(Observation::Missing),
        Err(e) => Err(e),
    }
}

/// Run `conf` against `refresh` under a wait span and translate failures.
pub(crate) async fn run_wait<R>(
    conf: StateChangeConf,
    refresh: &mut R,
    handle: &str,
    operation: &str,
) -> Result<R::Object>
where
    R: Refresh,
    R::Object: Debug,
{
    let wait = WaitSpan::start(handle, operation);
    let result = conf.wait_for_state(refresh).instrument(wait.span()).await;
    match result {
        Ok(object) => {
            wait.finish("succeeded");
            Ok(object)
        }
        Err(err) => {
            wait.finish(outcome(&err));
            Err(into_converge_error(err, handle, operation, conf.timeout()))
        }
    }
}

fn outcome<T: Debug>(err: &WaitError<T>) -> &'static str {
    match err {
        WaitError::Timeout { .. } => "timeout",
        WaitError::UnexpectedStatus { .. } => "unexpected_status",
        WaitError::NotFound { .. } => "not_found",
        WaitError::Refresh { .. } => "refresh_failed",
        WaitError::Cancelled { .. } => "cancelled",
    }
}

fn into_converge_error<T: Debug>(
    err: WaitError<T>,
    handle: &str,
    operation: &str,
    limit: Duration,
) -> ConvergeError {
    let handle = handle.to_string();
    let operation = operation.to_string();
    match err {
        WaitError::Timeout {
            last_status,
            last_object,
            ..
        } => {
            if let Some(object) = last_object {
                debug!(last_object = ?object, "last object observed before timeout");
            }
            ConvergeError::Timeout {
                handle,
                operation,
                last_status: last_status.unwrap_or_else(|| "<none>".to_string()),
                limit_ms: limit.as_millis() as u64,
                last_error: None,
            }
        }
        WaitError::UnexpectedStatus { status, object, .. } => {
            debug!(object = ?object, "object in unexpected status");
            ConvergeError::UnexpectedStatus {
                handle,
                operation,
                status,
            }
        }
        WaitError::NotFound { .. } => ConvergeError::NotFound { handle, operation },
        WaitError::Refresh { source } => ConvergeError::Api {
            handle,
            operation,
            source,
        },
        WaitError::Cancelled { .. } => ConvergeError::Cancelled { handle, operation },
    }
}
