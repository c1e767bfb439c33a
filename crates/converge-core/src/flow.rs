//! Mutate, then confirm.
//!
//! The usual shape of a create or update: issue the mutation through the
//! retry wrapper, then hand its result to a waiter that confirms the remote
//! side converged. Deletes follow the same shape, except that a delete
//! rejected because the resource is already gone counts as done.

use std::future::Future;

use converge_api::ApiResult;
use tracing::{debug, info};

use crate::domain::Result;
use crate::retry::{retry_mutation, ClientToken, RetryPolicy, RetryProfile};

/// Apply `mutate` under `profile`, then run `confirm` on its output.
///
/// Mutation failures come back as `ConvergeError::Api` (or `Cancelled`)
/// naming `handle` and `operation`; `confirm` reports its own errors.
pub async fn apply_and_confirm<T, C, F, Fut, W, WFut>(
    policy: &RetryPolicy,
    profile: RetryProfile,
    handle: &str,
    operation: &str,
    mutate: F,
    confirm: W,
) -> Result<C>
where
    F: FnMut(ClientToken) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    W: FnOnce(T) -> WFut,
    WFut: Future<Output = Result<C>>,
{
    let applied = retry_mutation(policy, profile, mutate)
        .await
        .map_err(|e| e.into_converge(handle, operation))?;
    info!(handle = %handle, operation = %operation, "mutation applied, confirming");
    confirm(applied).await
}

/// Delete under `profile`, then run `confirm` (typically an inactive or
/// deleted waiter).
///
/// When the delete finally fails with a not-found error the resource is
/// already gone: `confirm` is skipped and `Ok(None)` is returned.
pub async fn delete_and_confirm<T, C, F, Fut, W, WFut>(
    policy: &RetryPolicy,
    profile: RetryProfile,
    handle: &str,
    operation: &str,
    delete: F,
    confirm: W,
) -> Result<Option<C>>
where
    F: FnMut(ClientToken) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    W: FnOnce() -> WFut,
    WFut: Future<Output = Result<C>>,
{
    match retry_mutation(policy, profile, delete).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            debug!(handle = %handle, operation = %operation, "already deleted");
            return Ok(None);
        }
        Err(e) => return Err(e.into_converge(handle, operation)),
    }
    info!(handle = %handle, operation = %operation, "delete accepted, confirming");
    confirm().await.map(Some)
}
